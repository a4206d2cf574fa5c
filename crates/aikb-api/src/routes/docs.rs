use axum::Json;
use utoipa::OpenApi;

use crate::routes::{
    assistants, env_check, health, knowledge_sources, messages, runs, threads, Deleted, ErrorBody,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AIKB Gateway",
        description = "Azure AI Foundry agents and Azure AI Search knowledge sources behind server-held credentials"
    ),
    paths(
        health::health_check,
        env_check::env_check,
        assistants::list_assistants,
        assistants::create_assistant,
        assistants::get_assistant,
        assistants::update_assistant,
        assistants::delete_assistant,
        threads::create_thread,
        threads::list_threads,
        threads::get_thread,
        threads::delete_thread,
        messages::create_message,
        messages::list_messages,
        runs::create_run,
        runs::get_run,
        knowledge_sources::list_knowledge_sources,
        knowledge_sources::put_knowledge_source,
    ),
    components(schemas(
        ErrorBody,
        Deleted,
        health::HealthResponse,
        messages::CreateMessageRequest,
        env_check::EnvCheckReport,
        env_check::SearchPresence,
        env_check::FoundryPresence,
        env_check::IngestionPresence,
        env_check::IdentityPresence,
        env_check::EnvIssues,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "diagnostics", description = "Configuration presence"),
        (name = "assistants", description = "Foundry agents"),
        (name = "threads", description = "Conversation threads"),
        (name = "messages", description = "Thread messages"),
        (name = "runs", description = "Agent runs"),
        (name = "knowledge-sources", description = "Azure AI Search knowledge sources"),
    )
)]
pub struct ApiDoc;

/// OpenAPI document for the gateway
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
