use aikb_foundry::{MessageRole, NewMessage};
use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{ApiError, ApiResult},
    response::{JsonBody, QueryParams, Relay},
    routes::required,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
    /// `user` or `assistant`; absent or empty means `user`
    #[serde(default)]
    pub role: Option<String>,
    /// Plain text or an array of content parts
    #[serde(default)]
    #[schema(value_type = Object)]
    pub content: Value,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessagesQuery {
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
}

/// Append a message to a thread
#[utoipa::path(
    post,
    path = "/api/foundry/messages",
    request_body = CreateMessageRequest,
    responses(
        (status = 200, description = "Created message; thread id echoed in x-thread-id"),
        (status = 400, description = "threadId missing", body = ErrorBody)
    ),
    tag = "messages"
)]
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateMessageRequest>,
) -> ApiResult<Relay> {
    let thread_id = required(req.thread_id.as_deref())
        .ok_or_else(|| ApiError::BadRequest("threadId is required".to_string()))?;

    let role = match req.role.as_deref().map(str::trim) {
        None | Some("") => MessageRole::User,
        Some(role) => role.parse::<MessageRole>().map_err(ApiError::BadRequest)?,
    };

    let message = NewMessage {
        role,
        content: req.content,
    };

    let response = state
        .foundry
        .create_message(thread_id, &message)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to create message"))?;

    Ok(Relay::from(response).thread_id(Some(thread_id)))
}

/// List the messages of a thread
#[utoipa::path(
    get,
    path = "/api/foundry/messages",
    params(MessagesQuery),
    responses(
        (status = 200, description = "Upstream message list; thread id echoed in x-thread-id"),
        (status = 400, description = "threadId missing", body = ErrorBody)
    ),
    tag = "messages"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<MessagesQuery>,
) -> ApiResult<Relay> {
    let thread_id = required(query.thread_id.as_deref())
        .ok_or_else(|| ApiError::BadRequest("threadId query param is required".to_string()))?;

    let response = state
        .foundry
        .list_messages(thread_id)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to list messages"))?;

    Ok(Relay::from(response).thread_id(Some(thread_id)))
}
