//! # REST API Interface Layer
//!
//! Thin axum handlers over the domain services. Every handler except
//! sign-in identifies the caller through the `x-user-id` header, resolves it
//! to an [`Actor`] and checks the caller's role for the addressed family
//! before calling a service.
//!
//! Errors are rendered by [`ApiError`] as `{ "error": message }` with a
//! status code derived from the domain error.

pub mod completion_apis;
pub mod error;
pub mod family_apis;
pub mod highscore_group_apis;
pub mod kid_apis;
pub mod mappers;
pub mod redemption_apis;
pub mod reward_apis;
pub mod session_apis;
pub mod task_apis;

#[cfg(test)]
mod test_utils;

use axum::{http::HeaderMap, Router};

use crate::domain::Actor;
use crate::AppState;

pub use error::{ApiError, ApiResult};

/// Header carrying the uid asserted by the identity provider
pub const USER_ID_HEADER: &str = "x-user-id";

/// All API routes, to be nested under `/api`
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/session", session_apis::router())
        .nest("/families", family_apis::router())
        .nest("/highscore-groups", highscore_group_apis::router())
        .nest("/families/:family_id/kids", kid_apis::router())
        .nest("/families/:family_id/tasks", task_apis::router())
        .nest("/families/:family_id/completions", completion_apis::router())
        .nest("/families/:family_id/rewards", reward_apis::router())
        .nest("/families/:family_id/redemptions", redemption_apis::router())
}

/// Resolve the caller from the identity header
pub async fn current_actor(state: &AppState, headers: &HeaderMap) -> ApiResult<Actor> {
    let uid = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingIdentity)?;
    Ok(state.user_service.resolve_actor(uid).await?)
}
