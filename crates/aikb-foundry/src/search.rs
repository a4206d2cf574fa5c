// Azure AI Search client for knowledge sources

use reqwest::header::CACHE_CONTROL;
use reqwest::Method;
use url::Url;

use crate::client::default_http_client;
use crate::config::{IngestionSettings, SearchSettings};
use crate::error::{Result, UpstreamError};
use crate::response::{read_response, UpstreamResponse};
use crate::types::KnowledgeSourceDefinition;
use crate::url::UrlBuilder;

/// HTTP client for the knowledge-source endpoints of Azure AI Search
///
/// Authenticates with the static admin key in the `api-key` header.
pub struct SearchClient {
    http_client: reqwest::Client,
    settings: SearchSettings,
    ingestion: IngestionSettings,
}

impl SearchClient {
    pub fn new(settings: SearchSettings, ingestion: IngestionSettings) -> Result<Self> {
        Ok(Self::with_http_client(default_http_client()?, settings, ingestion))
    }

    pub fn with_http_client(
        http_client: reqwest::Client,
        settings: SearchSettings,
        ingestion: IngestionSettings,
    ) -> Self {
        Self {
            http_client,
            settings,
            ingestion,
        }
    }

    /// URL builder and key, or the first missing setting
    fn endpoint(&self) -> Result<(UrlBuilder, &str)> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| UpstreamError::NotConfigured("AZURE_SEARCH_API_KEY".to_string()))?;
        let api_version = self
            .settings
            .api_version
            .as_deref()
            .ok_or_else(|| UpstreamError::NotConfigured("AZURE_SEARCH_API_VERSION".to_string()))?;
        let urls = UrlBuilder::new(self.settings.endpoint.as_deref(), "AZURE_SEARCH_ENDPOINT", api_version)?;
        Ok((urls, api_key))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        api_key: &str,
        body: Option<&KnowledgeSourceDefinition>,
    ) -> Result<UpstreamResponse> {
        tracing::debug!(method = %method, path = %url.path(), "Calling Azure AI Search");

        let mut request = self
            .http_client
            .request(method, url)
            .header("api-key", api_key)
            .header(CACHE_CONTROL, "no-cache");
        if let Some(body) = body {
            request = request
                .header("Prefer", "return=representation")
                .json(body);
        }

        read_response(request.send().await?).await
    }

    pub async fn list_knowledge_sources(&self) -> Result<UpstreamResponse> {
        let (urls, api_key) = self.endpoint()?;
        let url = urls.segments(["knowledgesources"]);
        self.send(Method::GET, url, api_key, None).await
    }

    /// Create or replace a knowledge source, filling in server-held credentials
    pub async fn put_knowledge_source(
        &self,
        mut definition: KnowledgeSourceDefinition,
    ) -> Result<UpstreamResponse> {
        definition.validate()?;
        let (urls, api_key) = self.endpoint()?;

        definition.inject_credentials(&self.ingestion);

        let url = urls.segments([knowledge_source_segment(&definition.name)]);
        tracing::info!(name = %definition.name, "Upserting knowledge source");

        self.send(Method::PUT, url, api_key, Some(&definition)).await
    }
}

/// OData key segment, e.g. `knowledgesources('policies')`
fn knowledge_source_segment(name: &str) -> String {
    format!("knowledgesources('{}')", name.replace('\'', "''"))
}
