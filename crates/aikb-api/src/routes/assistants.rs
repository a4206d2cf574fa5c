use aikb_foundry::AgentPayload;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    response::{JsonBody, PathParam, Relay},
    routes::deleted,
    state::AppState,
};

/// List agents in the Foundry project
#[utoipa::path(
    get,
    path = "/api/foundry/assistants",
    responses(
        (status = 200, description = "Upstream agent list"),
        (status = 500, description = "Configuration or transport failure", body = ErrorBody)
    ),
    tag = "assistants"
)]
pub async fn list_assistants(State(state): State<Arc<AppState>>) -> ApiResult<Relay> {
    let response = state
        .foundry
        .list_agents()
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to list agents"))?;

    Ok(response.into())
}

/// Create an agent
///
/// Azure AI Search indexes are pointed at the server's search connection,
/// whatever connection id the client sent.
#[utoipa::path(
    post,
    path = "/api/foundry/assistants",
    responses(
        (status = 200, description = "Created agent"),
        (status = 400, description = "Missing name, model or index name", body = ErrorBody)
    ),
    tag = "assistants"
)]
pub async fn create_assistant(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<AgentPayload>,
) -> ApiResult<Relay> {
    let response = state
        .foundry
        .create_agent(payload)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to create agent"))?;

    tracing::info!(agent_id = ?response.id(), "Agent created");
    Ok(response.into())
}

#[utoipa::path(
    get,
    path = "/api/foundry/assistants/{id}",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Agent"),
        (status = 404, description = "Unknown agent", body = ErrorBody)
    ),
    tag = "assistants"
)]
pub async fn get_assistant(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<String>,
) -> ApiResult<Relay> {
    let response = state
        .foundry
        .get_agent(&id)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to get agent"))?;

    Ok(response.into())
}

/// Partially update an agent, re-injecting the search connection id
#[utoipa::path(
    patch,
    path = "/api/foundry/assistants/{id}",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Updated agent"),
        (status = 400, description = "Search index without a name", body = ErrorBody)
    ),
    tag = "assistants"
)]
pub async fn update_assistant(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<String>,
    JsonBody(payload): JsonBody<AgentPayload>,
) -> ApiResult<Relay> {
    let response = state
        .foundry
        .update_agent(&id, payload)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to update agent"))?;

    Ok(response.into())
}

#[utoipa::path(
    delete,
    path = "/api/foundry/assistants/{id}",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Agent deleted", body = Deleted),
        (status = 404, description = "Unknown agent", body = ErrorBody)
    ),
    tag = "assistants"
)]
pub async fn delete_assistant(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<String>,
) -> ApiResult<Response> {
    state
        .foundry
        .delete_agent(&id)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to delete agent"))?;

    tracing::info!(agent_id = %id, "Agent deleted");
    Ok(deleted(id).into_response())
}
