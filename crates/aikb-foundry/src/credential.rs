// Credential resolution for the Foundry agent service.
//
// Static keys are handed out as-is. Entra ID tokens are cached for the
// lifetime of the process and refreshed shortly before they expire; a
// refresh is single-flight, concurrent callers wait on the same fetch.

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use crate::config::{AuthMethod, AuthSettings};
use crate::error::{Result, UpstreamError};

/// Tokens are considered stale this long before they actually expire
const REFRESH_SKEW: Duration = Duration::from_secs(300);

/// Upper bound for a token round trip
const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);

/// A resolved credential, ready to be attached to an outbound request
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    ApiKey(String),
    Bearer(String),
}

impl Credential {
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credential::ApiKey(key) => request.header("api-key", key),
            Credential::Bearer(token) => request.bearer_auth(token),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credential::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// Source of credentials for upstream calls
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current credential, fetching one if nothing valid is cached
    async fn credential(&self) -> Result<Credential>;

    /// Force a new credential, bypassing the cache
    async fn refresh(&self) -> Result<Credential> {
        self.credential().await
    }

    /// Drop any cached credential
    async fn invalidate(&self) {}
}

/// Build the provider matching the configured auth method
pub fn provider_from_settings(settings: &AuthSettings) -> Result<Arc<dyn CredentialProvider>> {
    let provider: Arc<dyn CredentialProvider> = match settings.method {
        AuthMethod::ApiKey => Arc::new(StaticCredential::api_key(settings.api_key.clone())),
        AuthMethod::Bearer => Arc::new(StaticCredential::bearer(settings.bearer_token.clone())),
        AuthMethod::ClientSecret => Arc::new(ClientSecretCredential::new(settings)?),
    };
    Ok(provider)
}

/// A key or token that never changes during the process lifetime
pub struct StaticCredential {
    credential: Option<Credential>,
    setting: &'static str,
}

impl StaticCredential {
    pub fn api_key(key: Option<String>) -> Self {
        Self {
            credential: key.map(Credential::ApiKey),
            setting: "FOUNDRY_API_KEY",
        }
    }

    pub fn bearer(token: Option<String>) -> Self {
        Self {
            credential: token.map(Credential::Bearer),
            setting: "FOUNDRY_BEARER_TOKEN",
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn credential(&self) -> Result<Credential> {
        self.credential
            .clone()
            .ok_or_else(|| UpstreamError::NotConfigured(self.setting.to_string()))
    }
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_SKEW < self.expires_at
    }
}

/// Entra ID client-credentials flow with an in-process token cache
pub struct ClientSecretCredential {
    http_client: reqwest::Client,
    authority_host: String,
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    scope: String,
    cache: RwLock<Option<CachedToken>>,
    refresh_lock: Mutex<()>,
}

impl ClientSecretCredential {
    pub fn new(settings: &AuthSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(TOKEN_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            authority_host: settings.authority_host.trim_end_matches('/').to_string(),
            tenant_id: settings.tenant_id.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            scope: settings.scope.clone(),
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    async fn cached(&self) -> Option<Credential> {
        self.cache
            .read()
            .await
            .as_ref()
            .filter(|t| t.is_fresh())
            .map(|t| Credential::Bearer(t.token.clone()))
    }

    async fn fetch_and_store(&self) -> Result<Credential> {
        let token = self.fetch_token().await?;
        let credential = Credential::Bearer(token.access_token.clone());

        tracing::debug!("Obtained Foundry access token (expires in {}s)", token.expires_in);

        *self.cache.write().await = Some(CachedToken {
            token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        Ok(credential)
    }

    async fn fetch_token(&self) -> Result<TokenResponse> {
        let tenant_id = require(&self.tenant_id, "AZURE_TENANT_ID")?;
        let client_id = require(&self.client_id, "AZURE_CLIENT_ID")?;
        let client_secret = require(&self.client_secret, "AZURE_CLIENT_SECRET")?;

        let url = format!("{}/{}/oauth2/v2.0/token", self.authority_host, tenant_id);

        let response = self
            .http_client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| UpstreamError::Credential(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let description = serde_json::from_str::<TokenErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or(body);

            tracing::error!("Token endpoint returned {}: {}", status, description);
            return Err(UpstreamError::Credential(format!(
                "token endpoint returned {}: {}",
                status, description
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| UpstreamError::Credential(format!("invalid token response: {}", e)))
    }
}

#[async_trait]
impl CredentialProvider for ClientSecretCredential {
    async fn credential(&self) -> Result<Credential> {
        if let Some(credential) = self.cached().await {
            return Ok(credential);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(credential) = self.cached().await {
            return Ok(credential);
        }

        self.fetch_and_store().await
    }

    async fn refresh(&self) -> Result<Credential> {
        let _guard = self.refresh_lock.lock().await;
        self.fetch_and_store().await
    }

    async fn invalidate(&self) {
        *self.cache.write().await = None;
    }
}

fn require<'a>(value: &'a Option<String>, setting: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| UpstreamError::NotConfigured(setting.to_string()))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(deserialize_with = "deserialize_expires_in")]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

// v1 endpoints send expires_in as a string, v2 as a number
fn deserialize_expires_in<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
