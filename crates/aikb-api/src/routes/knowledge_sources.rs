use aikb_foundry::KnowledgeSourceDefinition;
use axum::{
    extract::State,
    http::header::{CACHE_CONTROL, EXPIRES, PRAGMA},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    response::{JsonBody, Relay},
    state::AppState,
};

/// List knowledge sources in Azure AI Search
///
/// Never cached by browsers or proxies, so a freshly created source shows
/// up on the next poll.
#[utoipa::path(
    get,
    path = "/api/knowledge-sources",
    responses(
        (status = 200, description = "Upstream knowledge-source list"),
        (status = 500, description = "Search settings missing", body = ErrorBody)
    ),
    tag = "knowledge-sources"
)]
pub async fn list_knowledge_sources(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let response = state
        .search
        .list_knowledge_sources()
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to list knowledge sources"))?;

    Ok((
        [
            (CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (PRAGMA, "no-cache"),
            (EXPIRES, "0"),
        ],
        Relay::from(response),
    )
        .into_response())
}

/// Create or replace a knowledge source
///
/// Storage connection strings and Azure OpenAI model credentials are filled
/// in from server configuration before the definition is sent upstream.
#[utoipa::path(
    put,
    path = "/api/knowledge-sources",
    request_body(content = Object, description = "Knowledge-source definition"),
    responses(
        (status = 200, description = "Stored definition"),
        (status = 201, description = "Created definition"),
        (status = 400, description = "name missing", body = ErrorBody)
    ),
    tag = "knowledge-sources"
)]
pub async fn put_knowledge_source(
    State(state): State<Arc<AppState>>,
    JsonBody(definition): JsonBody<KnowledgeSourceDefinition>,
) -> ApiResult<Relay> {
    let response = state
        .search
        .put_knowledge_source(definition)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to create knowledge source"))?;

    Ok(response.into())
}
