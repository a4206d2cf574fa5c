pub mod assistants;
pub mod docs;
pub mod env_check;
pub mod health;
pub mod knowledge_sources;
pub mod messages;
pub mod runs;
pub mod threads;

use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

/// Error envelope returned by every route
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    /// Raw upstream body, present when the upstream call failed
    #[schema(value_type = Option<Object>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Body returned after a successful delete
#[derive(Debug, Serialize, ToSchema)]
pub struct Deleted {
    pub deleted: bool,
    pub id: String,
}

pub(crate) fn deleted(id: String) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!(Deleted { deleted: true, id })))
}

/// Trimmed, non-empty value of an optional client field
pub(crate) fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
