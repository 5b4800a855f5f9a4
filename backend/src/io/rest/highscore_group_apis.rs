//! # REST API for Highscore Groups

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, put},
    Router,
};
use shared::{HighscoreGroup, HighscoreGroupListResponse, HighscoreGroupRequest};
use tracing::info;

use super::mappers::FamilyMapper;
use super::{current_actor, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route("/:group_id", put(rename_group).delete(delete_group))
}

pub async fn list_groups(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<HighscoreGroupListResponse>> {
    info!("GET /api/highscore-groups");

    current_actor(&state, &headers).await?.require_admin()?;
    let groups = state.family_service.list_highscore_groups().await?;
    Ok(Json(FamilyMapper::to_group_list_dto(groups)))
}

pub async fn create_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<HighscoreGroupRequest>,
) -> ApiResult<(StatusCode, Json<HighscoreGroup>)> {
    info!("POST /api/highscore-groups - name: {}", request.name);

    current_actor(&state, &headers).await?.require_admin()?;
    let group = state.family_service.create_highscore_group(&request.name).await?;
    Ok((StatusCode::CREATED, Json(FamilyMapper::to_group_dto(group))))
}

pub async fn rename_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    Json(request): Json<HighscoreGroupRequest>,
) -> ApiResult<Json<HighscoreGroup>> {
    info!("PUT /api/highscore-groups/{} - name: {}", group_id, request.name);

    current_actor(&state, &headers).await?.require_admin()?;
    let group = state
        .family_service
        .rename_highscore_group(&group_id, &request.name)
        .await?;
    Ok(Json(FamilyMapper::to_group_dto(group)))
}

pub async fn delete_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
) -> ApiResult<StatusCode> {
    info!("DELETE /api/highscore-groups/{}", group_id);

    current_actor(&state, &headers).await?.require_admin()?;
    state.family_service.delete_highscore_group(&group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
