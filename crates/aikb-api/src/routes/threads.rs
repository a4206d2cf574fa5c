use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    response::{PathParam, Relay},
    routes::deleted,
    state::AppState,
};

/// Create an empty thread
///
/// The new thread id is echoed in `x-thread-id`.
#[utoipa::path(
    post,
    path = "/api/foundry/threads",
    responses(
        (status = 200, description = "Thread created"),
        (status = 500, description = "Configuration or transport failure", body = ErrorBody)
    ),
    tag = "threads"
)]
pub async fn create_thread(State(state): State<Arc<AppState>>) -> ApiResult<Relay> {
    let response = state
        .foundry
        .create_thread()
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to create thread"))?;

    let thread_id = response.id().map(str::to_string);
    tracing::info!(thread_id = ?thread_id, "Thread created");

    Ok(Relay::from(response).thread_id(thread_id.as_deref()))
}

#[utoipa::path(
    get,
    path = "/api/foundry/threads",
    responses(
        (status = 200, description = "Upstream thread list")
    ),
    tag = "threads"
)]
pub async fn list_threads(State(state): State<Arc<AppState>>) -> ApiResult<Relay> {
    let response = state
        .foundry
        .list_threads()
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to list threads"))?;

    Ok(response.into())
}

#[utoipa::path(
    get,
    path = "/api/foundry/threads/{id}",
    params(("id" = String, Path, description = "Thread id")),
    responses(
        (status = 200, description = "Thread"),
        (status = 404, description = "Unknown thread", body = ErrorBody)
    ),
    tag = "threads"
)]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<String>,
) -> ApiResult<Relay> {
    let response = state
        .foundry
        .get_thread(&id)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to get thread"))?;

    Ok(response.into())
}

#[utoipa::path(
    delete,
    path = "/api/foundry/threads/{id}",
    params(("id" = String, Path, description = "Thread id")),
    responses(
        (status = 200, description = "Thread deleted", body = Deleted),
        (status = 404, description = "Unknown thread", body = ErrorBody)
    ),
    tag = "threads"
)]
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<String>,
) -> ApiResult<Response> {
    state
        .foundry
        .delete_thread(&id)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to delete thread"))?;

    tracing::info!(thread_id = %id, "Thread deleted");
    Ok(deleted(id).into_response())
}
