//! # REST API for Kids
//!
//! Kid profiles of a family and the views a kid works from: their task list,
//! the rewards they can redeem, their history and point summary.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use shared::{
    HistoryPeriod, Kid, KidHistoryResponse, KidListResponse, KidRequest, KidTaskListResponse,
    PointSummary, RewardListResponse, TaskViewPeriod,
};
use tracing::info;

use super::mappers::{KidMapper, RewardMapper, TaskMapper};
use super::{current_actor, ApiResult};
use crate::domain::models::Kid as DomainKid;
use crate::domain::Actor;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_kids).post(create_kid))
        .route("/:kid_id", get(get_kid).put(update_kid).delete(delete_kid))
        .route("/:kid_id/tasks", get(get_kid_tasks))
        .route("/:kid_id/rewards", get(get_redeemable_rewards))
        .route("/:kid_id/history", get(get_kid_history))
        .route("/:kid_id/summary", get(get_point_summary))
}

#[derive(Debug, Deserialize)]
pub struct TaskPeriodQuery {
    #[serde(default)]
    pub period: TaskViewPeriod,
}

#[derive(Debug, Deserialize)]
pub struct HistoryPeriodQuery {
    #[serde(default)]
    pub period: HistoryPeriod,
}

/// Load a kid the actor may act for: the kid's own account, a parent of the
/// family or an administrator
pub(super) async fn accessible_kid(
    state: &AppState,
    actor: &Actor,
    family_id: &str,
    kid_id: &str,
) -> ApiResult<DomainKid> {
    let kid = state.kid_service.get_kid(family_id, kid_id).await?;
    actor.require_kid_access(&kid)?;
    Ok(kid)
}

pub async fn list_kids(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
) -> ApiResult<Json<KidListResponse>> {
    info!("GET /api/families/{}/kids", family_id);

    current_actor(&state, &headers).await?.require_member(&family_id)?;
    let kids = state.kid_service.list_kids(&family_id).await?;
    Ok(Json(KidMapper::to_kid_list_dto(kids)))
}

pub async fn create_kid(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
    Json(request): Json<KidRequest>,
) -> ApiResult<(StatusCode, Json<Kid>)> {
    info!("POST /api/families/{}/kids - request: {:?}", family_id, request);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    let kid = state
        .kid_service
        .create_kid(&family_id, KidMapper::to_command(request))
        .await?;
    Ok((StatusCode::CREATED, Json(KidMapper::to_dto(kid))))
}

pub async fn get_kid(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, kid_id)): Path<(String, String)>,
) -> ApiResult<Json<Kid>> {
    info!("GET /api/families/{}/kids/{}", family_id, kid_id);

    let actor = current_actor(&state, &headers).await?;
    let kid = accessible_kid(&state, &actor, &family_id, &kid_id).await?;
    Ok(Json(KidMapper::to_dto(kid)))
}

pub async fn update_kid(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, kid_id)): Path<(String, String)>,
    Json(request): Json<KidRequest>,
) -> ApiResult<Json<Kid>> {
    info!("PUT /api/families/{}/kids/{} - request: {:?}", family_id, kid_id, request);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    let kid = state
        .kid_service
        .update_kid(&family_id, &kid_id, KidMapper::to_command(request))
        .await?;
    Ok(Json(KidMapper::to_dto(kid)))
}

pub async fn delete_kid(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, kid_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    info!("DELETE /api/families/{}/kids/{}", family_id, kid_id);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    state.kid_service.delete_kid(&family_id, &kid_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_kid_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, kid_id)): Path<(String, String)>,
    Query(query): Query<TaskPeriodQuery>,
) -> ApiResult<Json<KidTaskListResponse>> {
    info!("GET /api/families/{}/kids/{}/tasks?period={:?}", family_id, kid_id, query.period);

    let actor = current_actor(&state, &headers).await?;
    accessible_kid(&state, &actor, &family_id, &kid_id).await?;
    let entries = state
        .task_service
        .kid_tasks(&family_id, &kid_id, query.period)
        .await?;
    Ok(Json(TaskMapper::to_kid_task_list_dto(query.period, entries)))
}

pub async fn get_redeemable_rewards(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, kid_id)): Path<(String, String)>,
) -> ApiResult<Json<RewardListResponse>> {
    info!("GET /api/families/{}/kids/{}/rewards", family_id, kid_id);

    let actor = current_actor(&state, &headers).await?;
    accessible_kid(&state, &actor, &family_id, &kid_id).await?;
    let rewards = state
        .reward_service
        .redeemable_rewards(&family_id, &kid_id)
        .await?;
    Ok(Json(RewardMapper::to_reward_list_dto(rewards)))
}

pub async fn get_kid_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, kid_id)): Path<(String, String)>,
    Query(query): Query<HistoryPeriodQuery>,
) -> ApiResult<Json<KidHistoryResponse>> {
    info!("GET /api/families/{}/kids/{}/history?period={:?}", family_id, kid_id, query.period);

    let actor = current_actor(&state, &headers).await?;
    accessible_kid(&state, &actor, &family_id, &kid_id).await?;
    let history = state
        .history_service
        .kid_history(&family_id, &kid_id, query.period)
        .await?;
    Ok(Json(KidMapper::to_history_dto(query.period, history)))
}

pub async fn get_point_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, kid_id)): Path<(String, String)>,
) -> ApiResult<Json<PointSummary>> {
    info!("GET /api/families/{}/kids/{}/summary", family_id, kid_id);

    let actor = current_actor(&state, &headers).await?;
    accessible_kid(&state, &actor, &family_id, &kid_id).await?;
    let summary = state.history_service.point_summary(&family_id, &kid_id).await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use shared::{ErrorResponse, KidTaskListResponse};

    #[tokio::test]
    async fn test_non_member_is_forbidden() {
        let app = setup_app().await;
        let family_id = admin_family(&app).await;
        sign_in(&app, "stranger-uid", "stranger@example.com").await;

        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/families/{}/kids", family_id),
            Some("stranger-uid"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, "GET", "/api/families", Some("stranger-uid"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_blank_kid_name_is_bad_request() {
        let app = setup_app().await;
        let family_id = admin_family(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/families/{}/kids", family_id),
            Some(ADMIN_UID),
            Some(json!({ "name": "   " })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorResponse = parse(&body);
        assert!(!error.error.is_empty());
    }

    #[tokio::test]
    async fn test_kid_sees_todays_tasks() {
        let app = setup_app().await;
        let family_id = admin_family(&app).await;
        let kid = linked_kid(&app, &family_id).await;
        daily_task(&app, &family_id, 10).await;

        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/families/{}/kids/{}/tasks?period=today", family_id, kid.id),
            Some(KID_UID),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let tasks: KidTaskListResponse = parse(&body);
        assert_eq!(tasks.items.len(), 1);
    }
}
