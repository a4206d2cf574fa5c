use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    /// A required setting (endpoint, key, api version) is absent
    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse upstream response: {0}")]
    Decode(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The upstream answered with a non-success status
    #[error("Upstream returned {status}")]
    Status { status: StatusCode, body: Value },
}

impl UpstreamError {
    /// `error.message` from an Azure error body, when there is one
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            UpstreamError::Status { body, .. } => body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, UpstreamError>;
