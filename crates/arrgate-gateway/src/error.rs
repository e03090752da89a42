//! Gateway error types

use arrgate_kernel::gateway::KernelError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the gateway itself, as opposed to transport failures,
/// which are diagnosed and relayed as regular responses.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The call description was rejected before any network activity.
    #[error("{0}")]
    InvalidRequest(String),

    /// The gateway could not start or build a dependency.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<KernelError> for GatewayError {
    fn from(err: KernelError) -> Self {
        GatewayError::InvalidRequest(err.to_string())
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
