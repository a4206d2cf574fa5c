use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Liveness only: upstreams are not called. Each service reports whether
/// its required settings are present.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let upstream = &state.config.upstream;
    let mut services = HashMap::new();

    let foundry = upstream.foundry.project_endpoint.is_some();
    services.insert("foundry".to_string(), configured(foundry));

    let search = upstream.search.endpoint.is_some()
        && upstream.search.api_key.is_some()
        && upstream.search.api_version.is_some();
    services.insert("search".to_string(), configured(search));

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}

fn configured(present: bool) -> String {
    let status = if present { "configured" } else { "not-configured" };
    status.to_string()
}
