use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::nullable;
use crate::error::{Result, UpstreamError};

/// Per-tool resource configuration attached to an agent
///
/// Only `azure_ai_search` is interpreted here; other tool kinds
/// (code_interpreter, file_search, ...) are carried through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResources {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub azure_ai_search: Option<Option<AzureAiSearchResource>>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AzureAiSearchResource {
    #[serde(default)]
    pub indexes: Vec<SearchIndexRef>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference from an agent to a search index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchIndexRef {
    #[serde(default)]
    pub index_name: String,

    /// Always the server-configured connection once injected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_connection_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchIndexRef {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            ..Default::default()
        }
    }
}

impl ToolResources {
    pub fn search_indexes(&self) -> &[SearchIndexRef] {
        self.azure_ai_search
            .as_ref()
            .and_then(Option::as_ref)
            .map(|s| s.indexes.as_slice())
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        for (i, index) in self.search_indexes().iter().enumerate() {
            if index.index_name.trim().is_empty() {
                return Err(UpstreamError::InvalidPayload(format!(
                    "tool_resources.azure_ai_search.indexes[{}].index_name is required",
                    i
                )));
            }
        }
        Ok(())
    }

    /// Overwrite the connection id of every search index reference
    pub fn inject_connection_id(&mut self, connection_id: &str) {
        if let Some(search) = self.azure_ai_search.as_mut().and_then(Option::as_mut) {
            for index in &mut search.indexes {
                index.index_connection_id = Some(connection_id.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_other_tool_resources_preserved() {
        let raw = json!({
            "azure_ai_search": {"indexes": [{"index_name": "kb", "query_type": "semantic", "top_k": 5}]},
            "code_interpreter": {"file_ids": ["f1"]}
        });
        let resources: ToolResources = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(resources.search_indexes().len(), 1);
        assert_eq!(resources.search_indexes()[0].extra["query_type"], "semantic");
        assert_eq!(serde_json::to_value(&resources).unwrap(), raw);
    }

    #[test]
    fn test_missing_index_name_rejected() {
        let resources: ToolResources = serde_json::from_value(json!({
            "azure_ai_search": {"indexes": [{"index_name": "kb"}, {"top_k": 3}]}
        }))
        .unwrap();
        let err = resources.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid payload: tool_resources.azure_ai_search.indexes[1].index_name is required"
        );
    }

    #[test]
    fn test_inject_overwrites_every_index() {
        let mut resources = ToolResources {
            azure_ai_search: Some(Some(AzureAiSearchResource {
                indexes: vec![
                    SearchIndexRef::new("a"),
                    SearchIndexRef {
                        index_connection_id: Some("client-supplied".to_string()),
                        ..SearchIndexRef::new("b")
                    },
                ],
                extra: Map::new(),
            })),
            other: Map::new(),
        };

        resources.inject_connection_id("aikb-search");

        assert!(resources
            .search_indexes()
            .iter()
            .all(|i| i.index_connection_id.as_deref() == Some("aikb-search")));
    }

    #[test]
    fn test_null_search_resource_forwarded() {
        let raw = json!({"azure_ai_search": null, "code_interpreter": {"file_ids": []}});
        let mut resources: ToolResources = serde_json::from_value(raw.clone()).unwrap();
        assert!(resources.validate().is_ok());

        resources.inject_connection_id("aikb-search");
        assert_eq!(serde_json::to_value(&resources).unwrap(), raw);
    }
}
