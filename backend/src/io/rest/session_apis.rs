//! # REST API for Sessions
//!
//! Sign-in resolution, the current session and role switching.

use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use shared::{SessionResponse, SignInRequest, SwitchRoleRequest};
use tracing::info;

use super::mappers::FamilyMapper;
use super::{current_actor, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_session))
        .route("/sign-in", post(sign_in))
        .route("/role", post(switch_role))
}

/// Resolve an identity from the identity provider into a session
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> ApiResult<Json<SessionResponse>> {
    info!("POST /api/session/sign-in - uid: {}", request.uid);

    let command = FamilyMapper::to_sign_in_command(request);
    let result = state.user_service.sign_in(command).await?;
    Ok(Json(FamilyMapper::to_session_dto(result)))
}

pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionResponse>> {
    info!("GET /api/session");

    let actor = current_actor(&state, &headers).await?;
    let result = state.user_service.session(actor.uid()).await?;
    Ok(Json(FamilyMapper::to_session_dto(result)))
}

pub async fn switch_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SwitchRoleRequest>,
) -> ApiResult<Json<SessionResponse>> {
    info!("POST /api/session/role - request: {:?}", request);

    let actor = current_actor(&state, &headers).await?;
    let command = FamilyMapper::to_switch_role_command(actor.uid(), request);
    let result = state.user_service.switch_active_role(command).await?;
    Ok(Json(FamilyMapper::to_session_dto(result)))
}
