//! # REST API for Families
//!
//! Administrator management of families and their parents, plus the
//! family-wide leaderboard and dashboard counts.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use shared::{
    AddParentRequest, AddParentResponse, Family, FamilyListResponse, FamilyOverview, FamilyRequest,
    LeaderboardResponse,
};
use tracing::info;

use super::mappers::FamilyMapper;
use super::{current_actor, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_families).post(create_family))
        .route(
            "/:family_id",
            get(get_family).put(update_family).delete(delete_family),
        )
        .route("/:family_id/parents", post(add_parent))
        .route("/:family_id/highscores", get(get_highscores))
        .route("/:family_id/overview", get(get_overview))
}

#[derive(Debug, Deserialize)]
pub struct HighscoreQuery {
    /// Kid whose entry is flagged as the viewer's own
    pub kid_id: Option<String>,
}

pub async fn list_families(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<FamilyListResponse>> {
    info!("GET /api/families");

    current_actor(&state, &headers).await?.require_admin()?;
    let families = state.family_service.list_families().await?;
    Ok(Json(FamilyMapper::to_family_list_dto(families)))
}

pub async fn create_family(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<FamilyRequest>,
) -> ApiResult<(StatusCode, Json<Family>)> {
    info!("POST /api/families - request: {:?}", request);

    current_actor(&state, &headers).await?.require_admin()?;
    let family = state
        .family_service
        .create_family(FamilyMapper::to_command(request))
        .await?;
    Ok((StatusCode::CREATED, Json(FamilyMapper::to_dto(family))))
}

pub async fn get_family(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
) -> ApiResult<Json<Family>> {
    info!("GET /api/families/{}", family_id);

    current_actor(&state, &headers).await?.require_member(&family_id)?;
    let family = state.family_service.get_family(&family_id).await?;
    Ok(Json(FamilyMapper::to_dto(family)))
}

pub async fn update_family(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
    Json(request): Json<FamilyRequest>,
) -> ApiResult<Json<Family>> {
    info!("PUT /api/families/{} - request: {:?}", family_id, request);

    current_actor(&state, &headers).await?.require_admin()?;
    let family = state
        .family_service
        .update_family(&family_id, FamilyMapper::to_command(request))
        .await?;
    Ok(Json(FamilyMapper::to_dto(family)))
}

pub async fn delete_family(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
) -> ApiResult<StatusCode> {
    info!("DELETE /api/families/{}", family_id);

    current_actor(&state, &headers).await?.require_admin()?;
    state.family_service.delete_family(&family_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_parent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
    Json(request): Json<AddParentRequest>,
) -> ApiResult<Json<AddParentResponse>> {
    info!("POST /api/families/{}/parents - email: {}", family_id, request.email);

    current_actor(&state, &headers).await?.require_admin()?;
    let result = state
        .family_service
        .add_parent_by_email(&family_id, &request.email)
        .await?;
    Ok(Json(FamilyMapper::to_add_parent_dto(result)))
}

pub async fn get_highscores(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
    Query(query): Query<HighscoreQuery>,
) -> ApiResult<Json<LeaderboardResponse>> {
    info!("GET /api/families/{}/highscores", family_id);

    current_actor(&state, &headers).await?.require_member(&family_id)?;
    let board = state
        .highscore_service
        .leaderboard(&family_id, query.kid_id.as_deref())
        .await?;
    Ok(Json(board))
}

pub async fn get_overview(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
) -> ApiResult<Json<FamilyOverview>> {
    info!("GET /api/families/{}/overview", family_id);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    let overview = state.history_service.family_overview(&family_id).await?;
    Ok(Json(overview))
}
