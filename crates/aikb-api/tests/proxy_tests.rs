use aikb_api::{build_router, config::Config, state::AppState};
use aikb_foundry::UpstreamSettings;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

const SEARCH_VERSION: &str = "2025-11-01-preview";

fn settings(vars: &[(&str, String)]) -> UpstreamSettings {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    UpstreamSettings::from_lookup(|name| vars.get(name).cloned())
}

fn configured(server: &ServerGuard, extra: &[(&str, String)]) -> UpstreamSettings {
    let mut vars = vec![
        ("FOUNDRY_PROJECT_ENDPOINT", format!("{}/api/projects/demo", server.url())),
        ("FOUNDRY_API_KEY", "foundry-key".to_string()),
        ("AZURE_SEARCH_ENDPOINT", server.url()),
        ("AZURE_SEARCH_API_KEY", "search-key".to_string()),
        ("AZURE_SEARCH_API_VERSION", SEARCH_VERSION.to_string()),
    ];
    vars.extend(extra.iter().cloned());
    settings(&vars)
}

fn app(upstream: UpstreamSettings) -> Router {
    let state = AppState::new(Config::with_upstream(upstream)).unwrap();
    build_router(Arc::new(state))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_mock(server: &mut ServerGuard, method: &str, path: &str, status: usize, body: Value) -> Mock {
    server
        .mock(method, path)
        .match_query(Matcher::Any)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

#[tokio::test]
async fn test_create_run_sets_correlation_headers() {
    let mut server = Server::new_async().await;
    let run = server
        .mock("POST", "/api/projects/demo/threads/t1/runs")
        .match_query(Matcher::UrlEncoded("api-version".into(), "2025-05-15-preview".into()))
        .match_header("api-key", "foundry-key")
        .match_body(Matcher::Json(json!({"assistant_id": "a1"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"r1","status":"queued"}"#)
        .expect(1)
        .create_async()
        .await;

    let (status, headers, body) = send(
        app(configured(&server, &[])),
        with_json("POST", "/api/foundry/runs", json!({"threadId": "t1", "assistantId": "a1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-thread-id"], "t1");
    assert_eq!(headers["x-run-id"], "r1");
    assert_eq!(body, json!({"id": "r1", "status": "queued"}));
    run.assert_async().await;
}

#[tokio::test]
async fn test_get_run_relays_status_and_ids() {
    let mut server = Server::new_async().await;
    let run = json_mock(
        &mut server,
        "GET",
        "/api/projects/demo/threads/t1/runs/r1",
        200,
        json!({"id": "r1", "status": "completed"}),
    )
    .await;

    let (status, headers, body) = send(
        app(configured(&server, &[])),
        get("/api/foundry/runs/r1?threadId=t1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-thread-id"], "t1");
    assert_eq!(headers["x-run-id"], "r1");
    assert_eq!(body["status"], "completed");
    run.assert_async().await;
}

#[tokio::test]
async fn test_get_run_without_thread_id() {
    let mut server = Server::new_async().await;
    let upstream = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let (status, _, body) = send(app(configured(&server, &[])), get("/api/foundry/runs/r1")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "threadId query param is required"}));
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_invalid_input_never_reaches_upstream() {
    let mut server = Server::new_async().await;
    let mut guards = Vec::new();
    for method in ["GET", "POST", "PUT", "PATCH"] {
        guards.push(server.mock(method, Matcher::Any).expect(0).create_async().await);
    }
    let app = app(configured(&server, &[]));

    let cases = [
        (
            with_json("POST", "/api/foundry/assistants", json!({"model": "gpt-4o"})),
            "name is required",
        ),
        (
            with_json("POST", "/api/foundry/assistants", json!({"name": "kb agent"})),
            "model is required",
        ),
        (
            with_json(
                "PATCH",
                "/api/foundry/assistants/asst_1",
                json!({"tool_resources": {"azure_ai_search": {"indexes": [{"index_name": "a"}, {}]}}}),
            ),
            "tool_resources.azure_ai_search.indexes[1].index_name is required",
        ),
        (
            with_json("POST", "/api/foundry/messages", json!({"content": "hi"})),
            "threadId is required",
        ),
        (get("/api/foundry/messages"), "threadId query param is required"),
        (
            with_json("POST", "/api/foundry/runs", json!({"threadId": "t1"})),
            "threadId and assistantId are required",
        ),
        (
            with_json("PUT", "/api/knowledge-sources", json!({"kind": "azureBlob"})),
            "name is required",
        ),
    ];

    for (request, message) in cases {
        let (status, _, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{message}");
        assert_eq!(body, json!({"error": message}));
    }

    for guard in guards {
        guard.assert_async().await;
    }
}

#[tokio::test]
async fn test_upstream_error_envelope() {
    let mut server = Server::new_async().await;
    let _agent = json_mock(
        &mut server,
        "GET",
        "/api/projects/demo/assistants/missing",
        404,
        json!({"error": {"message": "not found"}}),
    )
    .await;

    let (status, _, body) = send(
        app(configured(&server, &[])),
        get("/api/foundry/assistants/missing"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"error": "not found", "details": {"error": {"message": "not found"}}})
    );
}

#[tokio::test]
async fn test_non_json_upstream_error_uses_fallback() {
    let mut server = Server::new_async().await;
    let _threads = server
        .mock("GET", "/api/projects/demo/threads")
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("Bad Gateway")
        .create_async()
        .await;

    let (status, _, body) = send(app(configured(&server, &[])), get("/api/foundry/threads")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"error": "Failed to list threads", "details": "Bad Gateway"}));
}

#[tokio::test]
async fn test_thread_lifecycle_round_trip() {
    let mut server = Server::new_async().await;
    let created = json!({"id": "thread_9", "object": "thread", "created_at": 1718000000, "metadata": {}});
    let create = json_mock(&mut server, "POST", "/api/projects/demo/threads", 200, created.clone()).await;
    let listing = json!({"object": "list", "data": [created.clone()], "has_more": false});
    let list = json_mock(&mut server, "GET", "/api/projects/demo/threads", 200, listing.clone()).await;
    let delete = server
        .mock("DELETE", "/api/projects/demo/threads/thread_9")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"thread_9","object":"thread.deleted","deleted":true}"#)
        .create_async()
        .await;

    let app = app(configured(&server, &[]));

    let (status, headers, body) = send(app.clone(), with_json("POST", "/api/foundry/threads", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-thread-id"], "thread_9");
    assert_eq!(body, created);

    let (_, _, body) = send(app.clone(), get("/api/foundry/threads")).await;
    assert_eq!(body, listing);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/foundry/threads/thread_9")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"deleted": true, "id": "thread_9"}));

    create.assert_async().await;
    list.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_messages_default_role_and_echo_thread() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/api/projects/demo/threads/t1/messages")
        .match_query(Matcher::Any)
        .match_body(Matcher::Json(json!({"role": "user", "content": "What is our refund policy?"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"msg_1","role":"user"}"#)
        .create_async()
        .await;
    let listing = json!({"data": [{"id": "msg_1"}], "first_id": "msg_1"});
    let list = json_mock(&mut server, "GET", "/api/projects/demo/threads/t1/messages", 200, listing.clone()).await;

    let app = app(configured(&server, &[]));

    let (status, headers, _) = send(
        app.clone(),
        with_json(
            "POST",
            "/api/foundry/messages",
            json!({"threadId": "t1", "content": "What is our refund policy?"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-thread-id"], "t1");

    let (_, headers, body) = send(app, get("/api/foundry/messages?threadId=t1")).await;
    assert_eq!(headers["x-thread-id"], "t1");
    assert_eq!(body, listing);

    create.assert_async().await;
    list.assert_async().await;
}

#[tokio::test]
async fn test_agent_connection_id_is_overridden() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/api/projects/demo/assistants")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "tool_resources": {"azure_ai_search": {"indexes": [
                {"index_name": "kb-hr", "index_connection_id": "tenant-search"}
            ]}}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"asst_7","object":"assistant"}"#)
        .expect(1)
        .create_async()
        .await;

    let (status, _, body) = send(
        app(configured(&server, &[("FOUNDRY_SEARCH_CONNECTION_ID", "tenant-search".to_string())])),
        with_json(
            "POST",
            "/api/foundry/assistants",
            json!({
                "name": "HR helper",
                "model": "gpt-4o-mini",
                "tools": [{"type": "azure_ai_search"}],
                "tool_resources": {"azure_ai_search": {"indexes": [
                    {"index_name": "kb-hr", "index_connection_id": "someone-elses-connection"}
                ]}}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "asst_7");
    create.assert_async().await;
}

#[tokio::test]
async fn test_list_knowledge_sources_is_not_cacheable() {
    let mut server = Server::new_async().await;
    let listing = json!({"value": [{"name": "policies", "kind": "azureBlob"}]});
    let list = server
        .mock("GET", "/knowledgesources")
        .match_query(Matcher::UrlEncoded("api-version".into(), SEARCH_VERSION.into()))
        .match_header("api-key", "search-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(listing.to_string())
        .create_async()
        .await;

    let (status, headers, body) = send(app(configured(&server, &[])), get("/api/knowledge-sources")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, listing);
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-store, must-revalidate");
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");
    list.assert_async().await;
}

#[tokio::test]
async fn test_knowledge_source_placeholder_is_replaced() {
    let mut server = Server::new_async().await;
    let put = server
        .mock("PUT", "/knowledgesources('policies')")
        .match_query(Matcher::Any)
        .match_header("prefer", "return=representation")
        .match_body(Matcher::PartialJson(json!({
            "name": "policies",
            "azureBlobParameters": {"connectionString": "DefaultEndpointsProtocol=https;AccountName=server"}
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"policies"}"#)
        .expect(1)
        .create_async()
        .await;

    let upstream = configured(
        &server,
        &[(
            "AZURE_STORAGE_CONNECTION_STRING",
            "DefaultEndpointsProtocol=https;AccountName=server".to_string(),
        )],
    );
    let (status, _, body) = send(
        app(upstream),
        with_json(
            "PUT",
            "/api/knowledge-sources",
            json!({
                "name": "policies",
                "kind": "azureBlob",
                "azureBlobParameters": {"connectionString": "__SERVER_INJECT__", "containerName": "docs"}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"name": "policies"}));
    put.assert_async().await;
}

#[tokio::test]
async fn test_knowledge_source_explicit_connection_string_is_kept() {
    let mut server = Server::new_async().await;
    let client_value = "DefaultEndpointsProtocol=https;AccountName=client";
    let put = server
        .mock("PUT", "/knowledgesources('policies')")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "azureBlobParameters": {"connectionString": client_value}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"policies"}"#)
        .expect(1)
        .create_async()
        .await;

    let upstream = configured(
        &server,
        &[("AZURE_STORAGE_CONNECTION_STRING", "AccountName=server".to_string())],
    );
    let (status, _, _) = send(
        app(upstream),
        with_json(
            "PUT",
            "/api/knowledge-sources",
            json!({"name": "policies", "azureBlobParameters": {"connectionString": client_value}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    put.assert_async().await;
}

#[tokio::test]
async fn test_missing_configuration_is_500() {
    let app = app(settings(&[]));

    let (status, _, body) = send(app.clone(), get("/api/foundry/assistants")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "FOUNDRY_PROJECT_ENDPOINT is not configured"}));

    let (status, _, body) = send(app, get("/api/knowledge-sources")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "AZURE_SEARCH_API_KEY is not configured"}));
}

#[tokio::test]
async fn test_malformed_json_body_is_500() {
    let server = Server::new_async().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/foundry/runs")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"threadId\": "))
        .unwrap();

    let (status, _, body) = send(app(configured(&server, &[])), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("invalid JSON body"));
}

#[tokio::test]
async fn test_env_check_reports_presence_only() {
    let server = Server::new_async().await;

    let (status, _, body) = send(app(configured(&server, &[])), get("/api/env-check")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["azureSearch"]["apiKey"], true);
    assert_eq!(body["azureFoundry"]["projectEndpoint"], true);
    assert_eq!(body["azureIdentity"]["authMethod"], "api-key");
    assert_eq!(body["issues"]["missingFoundryCredential"], false);

    let text = body.to_string();
    assert!(!text.contains("foundry-key"));
    assert!(!text.contains("search-key"));
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = app(settings(&[]));

    let (status, _, body) = send(app.clone(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["foundry"], "not-configured");

    let (status, _, body) = send(app, get("/api/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/foundry/runs/{id}"].is_object());
    assert!(body["paths"]["/api/knowledge-sources"]["put"].is_object());
}

#[tokio::test]
async fn test_run_option_assistant_id_replaces_assistant_id() {
    let mut server = Server::new_async().await;
    let run = server
        .mock("POST", "/api/projects/demo/threads/t1/runs")
        .match_query(Matcher::Any)
        .match_body(Matcher::AllOf(vec![
            Matcher::Json(json!({"assistant_id": "other"})),
            Matcher::Exact(r#"{"assistant_id":"other"}"#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"r2"}"#)
        .expect(1)
        .create_async()
        .await;

    let (status, headers, _) = send(
        app(configured(&server, &[])),
        with_json(
            "POST",
            "/api/foundry/runs",
            json!({"threadId": "t1", "assistantId": "a1", "assistant_id": "other"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-run-id"], "r2");
    run.assert_async().await;
}

#[tokio::test]
async fn test_empty_role_is_user() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/api/projects/demo/threads/t1/messages")
        .match_query(Matcher::Any)
        .match_body(Matcher::Json(json!({"role": "user", "content": "hi"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"msg_2"}"#)
        .expect(2)
        .create_async()
        .await;

    let app = app(configured(&server, &[]));
    for role in [json!(""), json!(null)] {
        let (status, _, _) = send(
            app.clone(),
            with_json(
                "POST",
                "/api/foundry/messages",
                json!({"threadId": "t1", "role": role, "content": "hi"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _, body) = send(
        app,
        with_json(
            "POST",
            "/api/foundry/messages",
            json!({"threadId": "t1", "role": "system", "content": "hi"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "unsupported role: system"}));

    create.assert_async().await;
}

#[tokio::test]
async fn test_extractor_rejections_use_envelope() {
    let mut server = Server::new_async().await;
    let upstream = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let app = app(configured(&server, &[]));
    for uri in [
        "/api/foundry/runs/r1?threadId=a&threadId=b",
        "/api/foundry/messages?threadId=a&threadId=b",
        "/api/foundry/assistants/%FF",
    ] {
        let (status, headers, body) = send(app.clone(), get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert!(body["error"].is_string(), "{}", uri);
    }

    let (_, _, body) = send(app, get("/api/foundry/runs/r1?threadId=a&threadId=b")).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("duplicate field `threadId`"));
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_request_timeout_uses_envelope() {
    // accepts connections and never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/api/projects/demo", listener.local_addr().unwrap());
    let silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let mut config = Config::with_upstream(settings(&[
        ("FOUNDRY_PROJECT_ENDPOINT", endpoint),
        ("FOUNDRY_API_KEY", "foundry-key".to_string()),
    ]));
    config.server.request_timeout_secs = 1;
    let app = build_router(Arc::new(AppState::new(config).unwrap()));

    let (status, headers, body) = send(app, get("/api/foundry/assistants")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(body, json!({"error": "request timed out"}));
    silent.abort();
}
