// Knowledge-source definitions for Azure AI Search.
//
// The shape follows the search REST schema: source-specific parameters live
// under `<kind>Parameters`, and ingestion models under
// `<kind>Parameters.ingestionParameters`. Only the fields that receive
// server-side credentials are typed; the rest is carried through verbatim,
// explicit nulls included.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::nullable;
use crate::config::IngestionSettings;
use crate::error::{Result, UpstreamError};

/// Marker a client sends to ask for the server-held value
pub const SERVER_INJECT_PLACEHOLDER: &str = "__SERVER_INJECT__";

const RESOURCE_ID_PREFIX: &str = "ResourceId=";

/// Classification of a client-supplied storage connection string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionString {
    Empty,
    Placeholder,
    /// `ResourceId=...`, which would need a managed identity
    ResourceId,
    /// A real connection string; never replaced
    Explicit,
}

impl ConnectionString {
    pub fn classify(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => ConnectionString::Empty,
            Some(SERVER_INJECT_PLACEHOLDER) => ConnectionString::Placeholder,
            Some(v) if v.starts_with(RESOURCE_ID_PREFIX) => ConnectionString::ResourceId,
            Some(_) => ConnectionString::Explicit,
        }
    }

    pub fn needs_server_value(self) -> bool {
        !matches!(self, ConnectionString::Explicit)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSourceDefinition {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "azureBlobParameters", default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub azure_blob: Option<Option<AzureBlobParameters>>,

    #[serde(rename = "indexedOneLakeParameters", default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub indexed_one_lake: Option<Option<IndexedSourceParameters>>,

    #[serde(rename = "indexedSharePointParameters", default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub indexed_share_point: Option<Option<IndexedSourceParameters>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AzureBlobParameters {
    #[serde(rename = "connectionString", default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<Option<String>>,

    #[serde(rename = "ingestionParameters", default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub ingestion: Option<Option<IngestionParameters>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexedSourceParameters {
    #[serde(rename = "ingestionParameters", default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub ingestion: Option<Option<IngestionParameters>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionParameters {
    #[serde(rename = "embeddingModel", default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<Option<ModelConfig>>,

    #[serde(rename = "chatCompletionModel", default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub chat_completion_model: Option<Option<ModelConfig>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Vectorizer / chat model used during ingestion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Option<ModelKind>>,

    #[serde(rename = "azureOpenAIParameters", default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub azure_openai: Option<Option<AzureOpenAiParameters>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelKind {
    AzureOpenAi,
    Other(String),
}

impl From<String> for ModelKind {
    fn from(s: String) -> Self {
        if s == "azureOpenAI" {
            ModelKind::AzureOpenAi
        } else {
            ModelKind::Other(s)
        }
    }
}

impl From<ModelKind> for String {
    fn from(kind: ModelKind) -> Self {
        match kind {
            ModelKind::AzureOpenAi => "azureOpenAI".to_string(),
            ModelKind::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AzureOpenAiParameters {
    #[serde(rename = "resourceUri", default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub resource_uri: Option<Option<String>>,

    #[serde(rename = "apiKey", default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<Option<String>>,

    #[serde(rename = "authIdentity", default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub auth_identity: Option<Option<Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelConfig {
    fn inject(&mut self, settings: &IngestionSettings) {
        if self.kind != Some(Some(ModelKind::AzureOpenAi)) {
            return;
        }
        let Some(params) = self.azure_openai.as_mut().and_then(Option::as_mut) else {
            return;
        };

        if let Some(endpoint) = &settings.openai_endpoint {
            params.resource_uri = Some(Some(endpoint.clone()));
        }
        if let Some(key) = &settings.openai_api_key {
            params.api_key = Some(Some(key.clone()));
        }
        params.auth_identity = None;
    }
}

impl IngestionParameters {
    fn inject(&mut self, settings: &IngestionSettings) {
        let embedding = self.embedding_model.as_mut().and_then(Option::as_mut);
        let chat = self.chat_completion_model.as_mut().and_then(Option::as_mut);

        for model in embedding.into_iter().chain(chat) {
            model.inject(settings);
        }
    }
}

impl KnowledgeSourceDefinition {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(UpstreamError::InvalidPayload("name is required".to_string()));
        }
        Ok(())
    }

    /// Fill server-held credentials into the definition
    ///
    /// Model endpoints and keys are always overwritten. The storage
    /// connection string only replaces empty, placeholder or identity-based
    /// values.
    pub fn inject_credentials(&mut self, settings: &IngestionSettings) {
        if let (Some(conn), Some(blob)) = (
            settings.storage_connection_string.as_deref(),
            self.azure_blob.as_mut().and_then(Option::as_mut),
        ) {
            let current = blob.connection_string.as_ref().and_then(Option::as_deref);
            if ConnectionString::classify(current).needs_server_value() {
                blob.connection_string = Some(Some(conn.to_string()));
            }
        }

        let blob = self
            .azure_blob
            .as_mut()
            .and_then(Option::as_mut)
            .and_then(|p| p.ingestion.as_mut())
            .and_then(Option::as_mut);
        let one_lake = indexed_ingestion(&mut self.indexed_one_lake);
        let share_point = indexed_ingestion(&mut self.indexed_share_point);

        for ingestion in blob.into_iter().chain(one_lake).chain(share_point) {
            ingestion.inject(settings);
        }
    }
}

fn indexed_ingestion(
    params: &mut Option<Option<IndexedSourceParameters>>,
) -> Option<&mut IngestionParameters> {
    params
        .as_mut()
        .and_then(Option::as_mut)
        .and_then(|p| p.ingestion.as_mut())
        .and_then(Option::as_mut)
}
