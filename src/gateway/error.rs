//! Gateway error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::messages::{error_codes, ApiResponse};

/// Errors surfaced by the gateway RPC surface.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    // === Authentication ===
    #[error("missing credentials")]
    MissingCredentials,

    #[error("user not registered")]
    UserNotRegistered,

    #[error("invalid credentials")]
    InvalidCredentials,

    // === Authorization ===
    #[error("unauthorized: {actor} cannot view data for {target}")]
    CrossUserAccess { actor: String, target: String },

    // === Validation ===
    #[error("{0}")]
    InvalidArgument(String),

    // === Payment flow ===
    #[error("{0}")]
    PreconditionFailed(String),

    #[error("{0}")]
    Aborted(String),

    #[error("{0}")]
    NotFound(String),

    // === System ===
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable error code for the response envelope.
    pub fn code(&self) -> i32 {
        match self {
            GatewayError::MissingCredentials | GatewayError::UserNotRegistered => {
                error_codes::UNAUTHENTICATED
            }
            GatewayError::InvalidCredentials | GatewayError::CrossUserAccess { .. } => {
                error_codes::FORBIDDEN
            }
            GatewayError::InvalidArgument(_) => error_codes::INVALID_PARAMETER,
            GatewayError::PreconditionFailed(_) => error_codes::PRECONDITION_FAILED,
            GatewayError::Aborted(_) => error_codes::TRANSACTION_ABORTED,
            GatewayError::NotFound(_) => error_codes::NOT_FOUND,
            GatewayError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            GatewayError::MissingCredentials | GatewayError::UserNotRegistered => {
                StatusCode::UNAUTHORIZED
            }
            GatewayError::InvalidCredentials | GatewayError::CrossUserAccess { .. } => {
                StatusCode::FORBIDDEN
            }
            GatewayError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            GatewayError::PreconditionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::Aborted(_) => StatusCode::CONFLICT,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body: ApiResponse<()> = ApiResponse::error(self.code(), self.to_string());
        (self.http_status(), Json(body)).into_response()
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(e: std::io::Error) -> Self {
        GatewayError::Internal(e.to_string())
    }
}
