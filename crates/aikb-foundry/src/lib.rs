pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod response;
pub mod search;
pub mod types;
pub mod url;

pub use client::{FoundryClient, FoundryClientBuilder};
pub use config::{
    AuthMethod, AuthSettings, FoundrySettings, IngestionSettings, SearchSettings, UpstreamSettings,
};
pub use credential::{
    provider_from_settings, ClientSecretCredential, Credential, CredentialProvider, StaticCredential,
};
pub use error::{Result, UpstreamError};
pub use response::UpstreamResponse;
pub use search::SearchClient;
pub use types::{AgentPayload, KnowledgeSourceDefinition, MessageRole, NewMessage, NewRun};
pub use crate::url::{versioned_url, UrlBuilder};
