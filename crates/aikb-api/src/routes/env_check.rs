use aikb_foundry::{AuthMethod, UpstreamSettings};
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

/// Which settings are present; values are never included
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvCheckReport {
    pub timestamp: String,
    pub environment: String,
    pub azure_search: SearchPresence,
    pub azure_foundry: FoundryPresence,
    pub ingestion: IngestionPresence,
    pub azure_identity: IdentityPresence,
    pub issues: EnvIssues,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchPresence {
    pub endpoint: bool,
    pub api_key: bool,
    pub api_version: bool,
    pub api_version_value: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FoundryPresence {
    pub project_endpoint: bool,
    pub api_key: bool,
    pub api_version_value: String,
    pub search_connection_id: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestionPresence {
    #[serde(rename = "storageConnectionString")]
    pub storage_connection_string: bool,
    #[serde(rename = "openAIEndpoint")]
    pub openai_endpoint: bool,
    #[serde(rename = "openAIKey")]
    pub openai_key: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPresence {
    pub auth_method: String,
    pub tenant_id: bool,
    pub client_id: bool,
    pub client_secret: bool,
}

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvIssues {
    pub missing_search_endpoint: bool,
    pub missing_search_key: bool,
    pub missing_search_api_version: bool,
    pub missing_foundry_project_endpoint: bool,
    pub missing_foundry_credential: bool,
    pub search_endpoint_invalid: bool,
    pub foundry_endpoint_invalid: bool,
}

/// Report which Azure settings the gateway was started with
#[utoipa::path(
    get,
    path = "/api/env-check",
    responses(
        (status = 200, description = "Presence report", body = EnvCheckReport)
    ),
    tag = "diagnostics"
)]
pub async fn env_check(State(state): State<Arc<AppState>>) -> Json<EnvCheckReport> {
    Json(build_report(
        &state.config.upstream,
        &state.config.environment,
    ))
}

pub fn build_report(settings: &UpstreamSettings, environment: &str) -> EnvCheckReport {
    let search = &settings.search;
    let foundry = &settings.foundry;
    let auth = &settings.auth;
    let ingestion = &settings.ingestion;

    let foundry_credential = match auth.method {
        AuthMethod::ApiKey => auth.api_key.is_some(),
        AuthMethod::Bearer => auth.bearer_token.is_some(),
        AuthMethod::ClientSecret => {
            auth.tenant_id.is_some() && auth.client_id.is_some() && auth.client_secret.is_some()
        }
    };

    let issues = EnvIssues {
        missing_search_endpoint: search.endpoint.is_none(),
        missing_search_key: search.api_key.is_none(),
        missing_search_api_version: search.api_version.is_none(),
        missing_foundry_project_endpoint: foundry.project_endpoint.is_none(),
        missing_foundry_credential: !foundry_credential,
        search_endpoint_invalid: not_https(search.endpoint.as_deref()),
        foundry_endpoint_invalid: not_https(foundry.project_endpoint.as_deref()),
    };

    let recommendations = recommendations(&issues, auth.method);

    EnvCheckReport {
        timestamp: chrono::Utc::now().to_rfc3339(),
        environment: environment.to_string(),
        azure_search: SearchPresence {
            endpoint: search.endpoint.is_some(),
            api_key: search.api_key.is_some(),
            api_version: search.api_version.is_some(),
            api_version_value: search
                .api_version
                .clone()
                .unwrap_or_else(|| "missing".to_string()),
        },
        azure_foundry: FoundryPresence {
            project_endpoint: foundry.project_endpoint.is_some(),
            api_key: auth.api_key.is_some(),
            api_version_value: foundry.api_version.clone(),
            search_connection_id: !foundry.search_connection_id.is_empty(),
        },
        ingestion: IngestionPresence {
            storage_connection_string: ingestion.storage_connection_string.is_some(),
            openai_endpoint: ingestion.openai_endpoint.is_some(),
            openai_key: ingestion.openai_api_key.is_some(),
        },
        azure_identity: IdentityPresence {
            auth_method: auth.method.to_string(),
            tenant_id: auth.tenant_id.is_some(),
            client_id: auth.client_id.is_some(),
            client_secret: auth.client_secret.is_some(),
        },
        issues,
        recommendations,
    }
}

fn not_https(endpoint: Option<&str>) -> bool {
    endpoint.is_some_and(|e| !e.starts_with("https://"))
}

fn recommendations(issues: &EnvIssues, method: AuthMethod) -> Vec<String> {
    let mut out = Vec::new();

    if issues.missing_search_endpoint {
        out.push("Set AZURE_SEARCH_ENDPOINT".to_string());
    }
    if issues.missing_search_key {
        out.push("Set AZURE_SEARCH_API_KEY".to_string());
    }
    if issues.missing_search_api_version {
        out.push("Set AZURE_SEARCH_API_VERSION (e.g. 2025-11-01-preview)".to_string());
    }
    if issues.missing_foundry_project_endpoint {
        out.push("Set FOUNDRY_PROJECT_ENDPOINT".to_string());
    }
    if issues.missing_foundry_credential {
        let hint = match method {
            AuthMethod::ApiKey => "Set FOUNDRY_API_KEY",
            AuthMethod::Bearer => "Set FOUNDRY_BEARER_TOKEN",
            AuthMethod::ClientSecret => "Set AZURE_TENANT_ID, AZURE_CLIENT_ID and AZURE_CLIENT_SECRET",
        };
        out.push(hint.to_string());
    }
    if issues.search_endpoint_invalid {
        out.push("AZURE_SEARCH_ENDPOINT should start with https://".to_string());
    }
    if issues.foundry_endpoint_invalid {
        out.push("FOUNDRY_PROJECT_ENDPOINT should start with https://".to_string());
    }

    if out.is_empty() {
        out.push("All required settings are present".to_string());
    } else {
        out.push("Restart the gateway after changing settings".to_string());
    }
    out
}
