use axum::{
    error_handling::HandleErrorLayer,
    http::{HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    BoxError, Router,
};
use std::{sync::Arc, time::Duration};
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    error::ApiError,
    middleware::logging,
    response::{RUN_ID_HEADER, THREAD_ID_HEADER},
    routes::{assistants, docs, env_check, health, knowledge_sources, messages, runs, threads},
    state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    let foundry_routes = Router::new()
        .route(
            "/assistants",
            get(assistants::list_assistants).post(assistants::create_assistant),
        )
        .route(
            "/assistants/:id",
            get(assistants::get_assistant)
                .patch(assistants::update_assistant)
                .delete(assistants::delete_assistant),
        )
        .route(
            "/threads",
            get(threads::list_threads).post(threads::create_thread),
        )
        .route(
            "/threads/:id",
            get(threads::get_thread).delete(threads::delete_thread),
        )
        .route(
            "/messages",
            get(messages::list_messages).post(messages::create_message),
        )
        .route("/runs", post(runs::create_run))
        .route("/runs/:id", get(runs::get_run));

    let api_routes = Router::new()
        .nest("/foundry", foundry_routes)
        .route(
            "/knowledge-sources",
            get(knowledge_sources::list_knowledge_sources).put(knowledge_sources::put_knowledge_source),
        )
        .route("/env-check", get(env_check::env_check))
        .route("/openapi.json", get(docs::openapi_json));

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(logging::log_request))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(middleware_error))
                .timeout(timeout),
        )
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Internal("request timed out".to_string())
    } else {
        ApiError::Internal(format!("request failed: {}", err))
    }
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(Any)
            .expose_headers([
                HeaderName::from_static(THREAD_ID_HEADER),
                HeaderName::from_static(RUN_ID_HEADER),
            ]);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            let parsed_origins: Vec<HeaderValue> = config
                .cors
                .origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect();

            cors.allow_origin(parsed_origins)
        }
    } else {
        CorsLayer::permissive()
    }
}
