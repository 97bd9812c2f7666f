use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde_json::json;
use thiserror::Error;

use crate::gateway::SynthesisError;

/// Request level failures, one variant per HTTP status the API can answer with
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad input shape or range
    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated, but not allowed to touch this resource
    #[error("{0}")]
    AuthorizationDenied(String),

    /// Unknown record or voice; carries a description of what was looked up
    #[error("{0} not found")]
    NotFound(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    /// Server side fault outside the datastore (hashing, task join)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AuthenticationRequired | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Synthesis(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Upstream and SQL details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Synthesis(e) => format!("Speech provider request failed: {}", e),
            AppError::Storage(_) => "Internal storage error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Synthesis(e) => error!("Synthesis gateway failure: {:?}", e),
            AppError::Storage(e) => error!("Storage failure: {}", e),
            AppError::Internal(e) => error!("Internal failure: {}", e),
            _ => {}
        }
        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}
