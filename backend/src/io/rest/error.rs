use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::ErrorResponse;
use tracing::{error, warn};

use crate::domain::ChoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by every handler, rendered as `{ "error": message }`
#[derive(Debug)]
pub enum ApiError {
    /// The identity header was missing or empty
    MissingIdentity,
    Domain(ChoreError),
}

impl From<ChoreError> for ApiError {
    fn from(e: ChoreError) -> Self {
        ApiError::Domain(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingIdentity => StatusCode::UNAUTHORIZED,
            ApiError::Domain(e) => match e {
                ChoreError::Validation(_) => StatusCode::BAD_REQUEST,
                ChoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                ChoreError::Forbidden(_) | ChoreError::NotAssigned { .. } => StatusCode::FORBIDDEN,
                ChoreError::InsufficientPoints { .. }
                | ChoreError::AlreadySubmitted { .. }
                | ChoreError::OccurrenceClosed { .. }
                | ChoreError::TaskInactive { .. }
                | ChoreError::Unschedulable { .. }
                | ChoreError::AlreadyRedeemed { .. }
                | ChoreError::Unavailable { .. }
                | ChoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
                ChoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::MissingIdentity => "Missing user identity".to_string(),
            ApiError::Domain(ChoreError::Store(e)) => {
                error!("Store failure: {}", e);
                "Internal storage error".to_string()
            }
            ApiError::Domain(e) => {
                warn!("Request failed ({}): {}", status, e);
                e.to_string()
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
