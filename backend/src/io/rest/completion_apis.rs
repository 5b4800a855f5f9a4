//! # REST API for Task Submissions
//!
//! Kids submit and withdraw; parents approve or reject.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use shared::{
    ApproveTaskRequest, ApproveTaskResponse, CompletedTask, CompletedTaskListResponse,
    RejectTaskRequest, RejectTaskResponse, SubmitTaskRequest,
};
use tracing::info;

use super::kid_apis::accessible_kid;
use super::mappers::TaskMapper;
use super::{current_actor, ApiResult};
use crate::domain::commands::task::{ApproveTaskCommand, RejectTaskCommand, SubmitTaskCommand};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_task))
        .route("/pending", get(list_pending))
        .route("/:completed_task_id", delete(withdraw_submission))
        .route("/:completed_task_id/approve", post(approve_task))
        .route("/:completed_task_id/reject", post(reject_task))
}

pub async fn submit_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
    Json(request): Json<SubmitTaskRequest>,
) -> ApiResult<(StatusCode, Json<CompletedTask>)> {
    info!("POST /api/families/{}/completions - request: {:?}", family_id, request);

    let actor = current_actor(&state, &headers).await?;
    accessible_kid(&state, &actor, &family_id, &request.kid_id).await?;

    let command = SubmitTaskCommand {
        family_id,
        kid_id: request.kid_id,
        task_id: request.task_id,
    };
    let completed = state.task_service.submit_task(command).await?;
    Ok((StatusCode::CREATED, Json(TaskMapper::to_completed_dto(completed))))
}

pub async fn withdraw_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, completed_task_id)): Path<(String, String)>,
) -> ApiResult<Json<CompletedTask>> {
    info!("DELETE /api/families/{}/completions/{}", family_id, completed_task_id);

    let actor = current_actor(&state, &headers).await?;
    let completed = state
        .approval_service
        .get_completion(&family_id, &completed_task_id)
        .await?;
    if !actor.is_parent_of(&family_id) {
        accessible_kid(&state, &actor, &family_id, &completed.kid_id).await?;
    }

    let withdrawn = state
        .task_service
        .withdraw_submission(&family_id, &completed_task_id)
        .await?;
    Ok(Json(TaskMapper::to_completed_dto(withdrawn)))
}

pub async fn list_pending(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
) -> ApiResult<Json<CompletedTaskListResponse>> {
    info!("GET /api/families/{}/completions/pending", family_id);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    let pending = state.approval_service.list_pending(&family_id).await?;
    Ok(Json(TaskMapper::to_completed_list_dto(pending)))
}

pub async fn approve_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, completed_task_id)): Path<(String, String)>,
    Json(request): Json<ApproveTaskRequest>,
) -> ApiResult<Json<ApproveTaskResponse>> {
    info!(
        "POST /api/families/{}/completions/{}/approve - request: {:?}",
        family_id, completed_task_id, request
    );

    let actor = current_actor(&state, &headers).await?;
    actor.require_parent(&family_id)?;

    let command = ApproveTaskCommand {
        family_id,
        completed_task_id,
        points_awarded: request.points_awarded,
        note: request.note,
        approver: actor.uid().to_string(),
    };
    let result = state.approval_service.approve(command).await?;
    Ok(Json(TaskMapper::to_approve_dto(result)))
}

pub async fn reject_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, completed_task_id)): Path<(String, String)>,
    Json(request): Json<RejectTaskRequest>,
) -> ApiResult<Json<RejectTaskResponse>> {
    info!(
        "POST /api/families/{}/completions/{}/reject - request: {:?}",
        family_id, completed_task_id, request
    );

    let actor = current_actor(&state, &headers).await?;
    actor.require_parent(&family_id)?;

    let command = RejectTaskCommand {
        family_id,
        completed_task_id,
        reopen: request.reopen,
        note: request.note,
        approver: actor.uid().to_string(),
    };
    let completed = state.approval_service.reject(command).await?;
    Ok(Json(RejectTaskResponse {
        completed_task: completed.map(TaskMapper::to_completed_dto),
    }))
}
