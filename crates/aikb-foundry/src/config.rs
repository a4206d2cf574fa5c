// Upstream settings for the Foundry agent service, Azure AI Search and ingestion credentials.
// Everything is optional here: a missing value fails the request that needs it, not startup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_AGENT_API_VERSION: &str = "2025-05-15-preview";
pub const DEFAULT_SEARCH_CONNECTION_ID: &str = "aikb-search";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_TOKEN_SCOPE: &str = "https://ai.azure.com/.default";

/// How requests to the Foundry agent service authenticate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    /// Static key sent in the `api-key` header
    #[default]
    ApiKey,
    /// OAuth2 client-credentials flow against Entra ID
    ClientSecret,
    /// Pre-issued bearer token
    Bearer,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::ApiKey => "api-key",
            AuthMethod::ClientSecret => "client-secret",
            AuthMethod::Bearer => "bearer",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api-key" | "apikey" | "key" => Ok(AuthMethod::ApiKey),
            "client-secret" | "service-principal" => Ok(AuthMethod::ClientSecret),
            "bearer" | "token" => Ok(AuthMethod::Bearer),
            other => Err(format!("unknown auth method '{}'", other)),
        }
    }
}

/// Foundry agent service settings
#[derive(Debug, Clone)]
pub struct FoundrySettings {
    /// Project endpoint, e.g. "https://my-hub.services.ai.azure.com/api/projects/my-project"
    pub project_endpoint: Option<String>,
    pub api_version: String,
    /// Connection id injected into every azure_ai_search index reference
    pub search_connection_id: String,
}

impl Default for FoundrySettings {
    fn default() -> Self {
        Self {
            project_endpoint: None,
            api_version: DEFAULT_AGENT_API_VERSION.to_string(),
            search_connection_id: DEFAULT_SEARCH_CONNECTION_ID.to_string(),
        }
    }
}

/// Credential settings for the Foundry agent service
#[derive(Clone)]
pub struct AuthSettings {
    pub method: AuthMethod,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub authority_host: String,
    pub scope: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            method: AuthMethod::default(),
            api_key: None,
            bearer_token: None,
            tenant_id: None,
            client_id: None,
            client_secret: None,
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            scope: DEFAULT_TOKEN_SCOPE.to_string(),
        }
    }
}

impl AuthSettings {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::ApiKey,
            api_key: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn client_secret(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            method: AuthMethod::ClientSecret,
            tenant_id: Some(tenant_id.into()),
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            ..Default::default()
        }
    }

    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = host.into();
        self
    }
}

// Keys and secrets never show up in debug output
impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("method", &self.method)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("authority_host", &self.authority_host)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Azure AI Search settings (knowledge sources)
#[derive(Clone, Default)]
pub struct SearchSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
}

impl fmt::Debug for SearchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Credentials injected into knowledge-source ingestion parameters
#[derive(Clone, Default)]
pub struct IngestionSettings {
    pub storage_connection_string: Option<String>,
    pub openai_endpoint: Option<String>,
    pub openai_api_key: Option<String>,
}

impl fmt::Debug for IngestionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionSettings")
            .field(
                "storage_connection_string",
                &self.storage_connection_string.as_ref().map(|_| "<redacted>"),
            )
            .field("openai_endpoint", &self.openai_endpoint)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Complete upstream configuration
#[derive(Debug, Clone, Default)]
pub struct UpstreamSettings {
    pub foundry: FoundrySettings,
    pub auth: AuthSettings,
    pub search: SearchSettings,
    pub ingestion: IngestionSettings,
}

impl UpstreamSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup (empty values count as unset)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let foundry_api_key = get("FOUNDRY_API_KEY");
        let client_secret = get("AZURE_CLIENT_SECRET");

        let method = match get("AZURE_AUTH_METHOD") {
            Some(raw) => match raw.parse::<AuthMethod>() {
                Ok(method) => method,
                Err(e) => {
                    tracing::warn!("Ignoring AZURE_AUTH_METHOD: {}", e);
                    infer_auth_method(client_secret.is_some())
                }
            },
            None => infer_auth_method(client_secret.is_some()),
        };

        Self {
            foundry: FoundrySettings {
                project_endpoint: get("FOUNDRY_PROJECT_ENDPOINT"),
                api_version: get("FOUNDRY_AGENT_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_AGENT_API_VERSION.to_string()),
                search_connection_id: get("FOUNDRY_SEARCH_CONNECTION_ID")
                    .unwrap_or_else(|| DEFAULT_SEARCH_CONNECTION_ID.to_string()),
            },
            auth: AuthSettings {
                method,
                api_key: foundry_api_key.clone(),
                bearer_token: get("FOUNDRY_BEARER_TOKEN"),
                tenant_id: get("AZURE_TENANT_ID"),
                client_id: get("AZURE_CLIENT_ID"),
                client_secret,
                authority_host: get("AZURE_AUTHORITY_HOST")
                    .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string()),
                scope: get("FOUNDRY_TOKEN_SCOPE").unwrap_or_else(|| DEFAULT_TOKEN_SCOPE.to_string()),
            },
            search: SearchSettings {
                endpoint: get("AZURE_SEARCH_ENDPOINT"),
                api_key: get("AZURE_SEARCH_API_KEY"),
                api_version: get("AZURE_SEARCH_API_VERSION"),
            },
            ingestion: IngestionSettings {
                storage_connection_string: get("AZURE_STORAGE_CONNECTION_STRING"),
                openai_endpoint: get("AZURE_OPENAI_ENDPOINT"),
                openai_api_key: get("AZURE_OPENAI_API_KEY").or(foundry_api_key),
            },
        }
    }
}

fn infer_auth_method(has_client_secret: bool) -> AuthMethod {
    if has_client_secret {
        AuthMethod::ClientSecret
    } else {
        AuthMethod::ApiKey
    }
}
