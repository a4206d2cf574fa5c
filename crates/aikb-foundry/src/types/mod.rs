use serde::{Deserialize, Deserializer};

pub mod agent;
pub mod knowledge_source;
pub mod message;
pub mod tool;

pub use agent::AgentPayload;
pub use knowledge_source::{
    AzureBlobParameters, AzureOpenAiParameters, ConnectionString, IndexedSourceParameters,
    IngestionParameters, KnowledgeSourceDefinition, ModelConfig, ModelKind,
    SERVER_INJECT_PLACEHOLDER,
};
pub use message::{MessageRole, NewMessage, NewRun};
pub use tool::{AzureAiSearchResource, SearchIndexRef, ToolResources};

/// Keeps an explicit `null` apart from an absent field
///
/// Used with `Option<Option<T>>` and `default`: absent is `None`, `null` is
/// `Some(None)`, and `skip_serializing_if = "Option::is_none"` writes the
/// `null` back out.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
