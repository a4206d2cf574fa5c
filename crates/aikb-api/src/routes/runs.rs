use aikb_foundry::NewRun;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    error::{ApiError, ApiResult},
    response::{JsonBody, PathParam, QueryParams, Relay},
    routes::required,
    state::AppState,
};

/// Every field besides the two ids is forwarded as a run option
#[derive(Debug, Deserialize)]
pub struct CreateRunRequest {
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
    #[serde(rename = "assistantId")]
    pub assistant_id: Option<String>,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RunQuery {
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
}

/// Start a run of an agent on a thread
#[utoipa::path(
    post,
    path = "/api/foundry/runs",
    request_body(content = Object, description = "threadId, assistantId and any run options"),
    responses(
        (status = 200, description = "Run created; ids echoed in x-thread-id and x-run-id"),
        (status = 400, description = "threadId or assistantId missing", body = ErrorBody)
    ),
    tag = "runs"
)]
pub async fn create_run(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateRunRequest>,
) -> ApiResult<Relay> {
    let (thread_id, assistant_id) = match (
        required(req.thread_id.as_deref()),
        required(req.assistant_id.as_deref()),
    ) {
        (Some(thread), Some(assistant)) => (thread, assistant),
        _ => {
            return Err(ApiError::BadRequest(
                "threadId and assistantId are required".to_string(),
            ))
        }
    };

    let run = NewRun {
        assistant_id: assistant_id.to_string(),
        options: req.options,
    };

    let response = state
        .foundry
        .create_run(thread_id, &run)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to create run"))?;

    let run_id = response.id().map(str::to_string);
    tracing::info!(thread_id = %thread_id, run_id = ?run_id, "Run started");

    Ok(Relay::from(response)
        .thread_id(Some(thread_id))
        .run_id(run_id.as_deref()))
}

/// Fetch run status; clients poll this until the run is terminal
#[utoipa::path(
    get,
    path = "/api/foundry/runs/{id}",
    params(
        ("id" = String, Path, description = "Run id"),
        RunQuery
    ),
    responses(
        (status = 200, description = "Run; ids echoed in x-thread-id and x-run-id"),
        (status = 400, description = "threadId missing", body = ErrorBody)
    ),
    tag = "runs"
)]
pub async fn get_run(
    State(state): State<Arc<AppState>>,
    PathParam(run_id): PathParam<String>,
    QueryParams(query): QueryParams<RunQuery>,
) -> ApiResult<Relay> {
    let thread_id = required(query.thread_id.as_deref())
        .ok_or_else(|| ApiError::BadRequest("threadId query param is required".to_string()))?;

    let response = state
        .foundry
        .get_run(thread_id, &run_id)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to get run"))?;

    Ok(Relay::from(response)
        .thread_id(Some(thread_id))
        .run_id(Some(&run_id)))
}
