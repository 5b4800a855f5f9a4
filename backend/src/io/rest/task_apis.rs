//! # REST API for Task Definitions

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, put},
    Router,
};
use shared::{SetTaskActiveRequest, Task, TaskListResponse, TaskRequest};
use tracing::info;

use super::mappers::TaskMapper;
use super::{current_actor, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:task_id", get(get_task).put(update_task).delete(delete_task))
        .route("/:task_id/active", put(set_task_active))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
) -> ApiResult<Json<TaskListResponse>> {
    info!("GET /api/families/{}/tasks", family_id);

    current_actor(&state, &headers).await?.require_member(&family_id)?;
    let tasks = state.task_service.list_tasks(&family_id).await?;
    Ok(Json(TaskMapper::to_task_list_dto(tasks)))
}

pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
    Json(request): Json<TaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    info!("POST /api/families/{}/tasks - request: {:?}", family_id, request);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    let task = state
        .task_service
        .create_task(&family_id, TaskMapper::to_command(request))
        .await?;
    Ok((StatusCode::CREATED, Json(TaskMapper::to_dto(task))))
}

pub async fn get_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, task_id)): Path<(String, String)>,
) -> ApiResult<Json<Task>> {
    info!("GET /api/families/{}/tasks/{}", family_id, task_id);

    current_actor(&state, &headers).await?.require_member(&family_id)?;
    let task = state.task_service.get_task(&family_id, &task_id).await?;
    Ok(Json(TaskMapper::to_dto(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, task_id)): Path<(String, String)>,
    Json(request): Json<TaskRequest>,
) -> ApiResult<Json<Task>> {
    info!("PUT /api/families/{}/tasks/{} - request: {:?}", family_id, task_id, request);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    let task = state
        .task_service
        .update_task(&family_id, &task_id, TaskMapper::to_command(request))
        .await?;
    Ok(Json(TaskMapper::to_dto(task)))
}

pub async fn set_task_active(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, task_id)): Path<(String, String)>,
    Json(request): Json<SetTaskActiveRequest>,
) -> ApiResult<Json<Task>> {
    info!("PUT /api/families/{}/tasks/{}/active - {}", family_id, task_id, request.is_active);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    let task = state
        .task_service
        .set_task_active(&family_id, &task_id, request.is_active)
        .await?;
    Ok(Json(TaskMapper::to_dto(task)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, task_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    info!("DELETE /api/families/{}/tasks/{}", family_id, task_id);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    state.task_service.delete_task(&family_id, &task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_create_daily_task_schedules_today() {
        let app = setup_app().await;
        let family_id = admin_family(&app).await;

        let task = daily_task(&app, &family_id, 10).await;

        assert_eq!(task.next_due_date.as_deref(), Some("2024-01-08"));
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let app = setup_app().await;
        let family_id = admin_family(&app).await;

        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/families/{}/tasks/missing", family_id),
            Some(ADMIN_UID),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
