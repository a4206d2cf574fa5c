use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{Result, UpstreamError};

/// A successful upstream reply, relayed as received
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl UpstreamResponse {
    /// The `id` field of the returned resource, if any
    pub fn id(&self) -> Option<&str> {
        self.body.get("id").and_then(Value::as_str)
    }
}

/// Turn a raw reply into either an [`UpstreamResponse`] or [`UpstreamError::Status`]
///
/// Success bodies must be JSON (an empty body becomes `{}`). Error bodies
/// that are not JSON are kept as a JSON string so they can still be relayed.
pub async fn read_response(response: reqwest::Response) -> Result<UpstreamResponse> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Default::default())
        } else {
            serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))?
        };
        return Ok(UpstreamResponse { status, body });
    }

    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    Err(UpstreamError::Status { status, body })
}
