use aikb_foundry::{client::default_http_client, provider_from_settings, FoundryClient, SearchClient};
use std::sync::Arc;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// Both upstream clients share one reqwest connection pool.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub foundry: Arc<FoundryClient>,
    pub search: Arc<SearchClient>,
}

impl AppState {
    pub fn new(config: Config) -> aikb_foundry::Result<Self> {
        let http_client = default_http_client()?;
        let upstream = &config.upstream;

        let foundry = FoundryClient::builder()
            .settings(upstream.foundry.clone())
            .credentials(provider_from_settings(&upstream.auth)?)
            .http_client(http_client.clone())
            .build()?;

        let search = SearchClient::with_http_client(
            http_client,
            upstream.search.clone(),
            upstream.ingestion.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            foundry: Arc::new(foundry),
            search: Arc::new(search),
        })
    }
}
