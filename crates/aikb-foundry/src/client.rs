// Foundry Agent Service client (assistants, threads, messages, runs)

use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use url::Url;

use crate::config::FoundrySettings;
use crate::credential::{Credential, CredentialProvider};
use crate::error::{Result, UpstreamError};
use crate::response::{read_response, UpstreamResponse};
use crate::types::{AgentPayload, NewMessage, NewRun};
use crate::url::UrlBuilder;

const ENDPOINT_SETTING: &str = "FOUNDRY_PROJECT_ENDPOINT";

/// HTTP client for the Foundry agent service
///
/// Each method is a single round trip. Agent create/update bodies get the
/// configured search connection id injected before they leave the process.
pub struct FoundryClient {
    http_client: reqwest::Client,
    settings: FoundrySettings,
    credentials: Arc<dyn CredentialProvider>,
}

impl FoundryClient {
    pub fn builder() -> FoundryClientBuilder {
        FoundryClientBuilder::default()
    }

    pub fn settings(&self) -> &FoundrySettings {
        &self.settings
    }

    fn urls(&self) -> Result<UrlBuilder> {
        UrlBuilder::new(
            self.settings.project_endpoint.as_deref(),
            ENDPOINT_SETTING,
            self.settings.api_version.as_str(),
        )
    }

    async fn send<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<UpstreamResponse>
    where
        B: Serialize + ?Sized,
    {
        let credential = self.credentials.credential().await?;

        tracing::debug!(method = %method, path = %url.path(), "Calling Foundry agent service");

        let mut request = credential
            .apply(self.http_client.request(method, url))
            .header(CACHE_CONTROL, "no-store");
        if let Some(body) = body {
            request = request.json(body);
        }

        let result = read_response(request.send().await?).await;

        // A rejected token is dropped so the next request fetches a new one
        if let Err(UpstreamError::Status { status, .. }) = &result {
            if *status == StatusCode::UNAUTHORIZED && matches!(credential, Credential::Bearer(_)) {
                tracing::warn!("Foundry rejected the cached token, invalidating it");
                self.credentials.invalidate().await;
            }
        }

        result
    }

    // ------------------------------------------------------------------
    // Agents
    // ------------------------------------------------------------------

    pub async fn list_agents(&self) -> Result<UpstreamResponse> {
        let url = self.urls()?.segments(["assistants"]);
        self.send::<()>(Method::GET, url, None).await
    }

    pub async fn create_agent(&self, payload: AgentPayload) -> Result<UpstreamResponse> {
        payload.validate_for_create()?;

        let mut payload = payload.into_create_body();
        payload.inject_connection_id(&self.settings.search_connection_id);

        let url = self.urls()?.segments(["assistants"]);
        self.send(Method::POST, url, Some(&payload)).await
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<UpstreamResponse> {
        let url = self.urls()?.segments(["assistants", agent_id]);
        self.send::<()>(Method::GET, url, None).await
    }

    pub async fn update_agent(&self, agent_id: &str, mut payload: AgentPayload) -> Result<UpstreamResponse> {
        payload.validate()?;
        payload.inject_connection_id(&self.settings.search_connection_id);

        let url = self.urls()?.segments(["assistants", agent_id]);
        self.send(Method::PATCH, url, Some(&payload)).await
    }

    pub async fn delete_agent(&self, agent_id: &str) -> Result<UpstreamResponse> {
        let url = self.urls()?.segments(["assistants", agent_id]);
        self.send::<()>(Method::DELETE, url, None).await
    }

    // ------------------------------------------------------------------
    // Threads
    // ------------------------------------------------------------------

    pub async fn create_thread(&self) -> Result<UpstreamResponse> {
        let url = self.urls()?.segments(["threads"]);
        self.send(Method::POST, url, Some(&serde_json::json!({}))).await
    }

    pub async fn list_threads(&self) -> Result<UpstreamResponse> {
        let url = self.urls()?.segments(["threads"]);
        self.send::<()>(Method::GET, url, None).await
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<UpstreamResponse> {
        let url = self.urls()?.segments(["threads", thread_id]);
        self.send::<()>(Method::GET, url, None).await
    }

    pub async fn delete_thread(&self, thread_id: &str) -> Result<UpstreamResponse> {
        let url = self.urls()?.segments(["threads", thread_id]);
        self.send::<()>(Method::DELETE, url, None).await
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    pub async fn create_message(&self, thread_id: &str, message: &NewMessage) -> Result<UpstreamResponse> {
        let url = self.urls()?.segments(["threads", thread_id, "messages"]);
        self.send(Method::POST, url, Some(message)).await
    }

    pub async fn list_messages(&self, thread_id: &str) -> Result<UpstreamResponse> {
        let url = self.urls()?.segments(["threads", thread_id, "messages"]);
        self.send::<()>(Method::GET, url, None).await
    }

    // ------------------------------------------------------------------
    // Runs
    // ------------------------------------------------------------------

    pub async fn create_run(&self, thread_id: &str, run: &NewRun) -> Result<UpstreamResponse> {
        let url = self.urls()?.segments(["threads", thread_id, "runs"]);
        self.send(Method::POST, url, Some(run)).await
    }

    /// Clients poll this until the run reaches a terminal status
    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<UpstreamResponse> {
        let url = self.urls()?.segments(["threads", thread_id, "runs", run_id]);
        self.send::<()>(Method::GET, url, None).await
    }
}

/// Builder for FoundryClient
#[derive(Default)]
pub struct FoundryClientBuilder {
    settings: Option<FoundrySettings>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    http_client: Option<reqwest::Client>,
}

impl FoundryClientBuilder {
    pub fn settings(mut self, settings: FoundrySettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Share an existing HTTP client (connection pool)
    pub fn http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn build(self) -> Result<FoundryClient> {
        let credentials = self
            .credentials
            .ok_or_else(|| UpstreamError::InvalidConfig("credential provider is required".to_string()))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => default_http_client()?,
        };

        Ok(FoundryClient {
            http_client,
            settings: self.settings.unwrap_or_default(),
            credentials,
        })
    }
}

/// JSON client shared by the upstream clients
pub fn default_http_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(reqwest::Client::builder().default_headers(headers).build()?)
}
