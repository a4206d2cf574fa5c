use aikb_foundry::UpstreamError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Every failure a handler can produce, rendered as `{error, details?}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Config(String),

    /// Non-success reply from Foundry or Search, relayed with its status
    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: String,
        details: Value,
    },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Map an upstream failure; `fallback` is used when the upstream body
    /// carries no `error.message`
    pub fn upstream(err: UpstreamError, fallback: &str) -> Self {
        let message = err.upstream_message().map(str::to_string);
        match err {
            UpstreamError::InvalidPayload(msg) => ApiError::BadRequest(msg),
            UpstreamError::NotConfigured(_)
            | UpstreamError::InvalidConfig(_)
            | UpstreamError::Credential(_) => ApiError::Config(err.to_string()),
            UpstreamError::Status { status, body } => ApiError::Upstream {
                status,
                message: message.unwrap_or_else(|| fallback.to_string()),
                details: body,
            },
            UpstreamError::Transport(_) | UpstreamError::Decode(_) => ApiError::Internal(err.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Config(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        ApiError::upstream(err, "Upstream request failed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::BadRequest(message) => {
                tracing::debug!("Rejected request: {}", message);
                json!({ "error": message })
            }
            ApiError::Config(message) => {
                tracing::error!("Configuration error: {}", message);
                json!({ "error": message })
            }
            ApiError::Upstream { status, message, details } => {
                tracing::error!("Upstream error ({}): {}", status, message);
                json!({ "error": message, "details": details })
            }
            ApiError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                json!({ "error": message })
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
