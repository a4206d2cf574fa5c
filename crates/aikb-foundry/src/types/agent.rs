use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::nullable;
use super::tool::ToolResources;
use crate::error::{Result, UpstreamError};

/// Create or update body for a Foundry agent
///
/// Every field is optional so the same shape serves partial updates. An
/// explicit `null` is kept apart from an absent field and forwarded as
/// received, as are fields this layer does not know about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentPayload {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,

    /// Model deployment name
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub model: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Option<String>>,

    /// Enabled tools, in order
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub tools: Option<Option<Vec<Value>>>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<Option<ToolResources>>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Option<Map<String, Value>>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentPayload {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: Some(Some(name.into())),
            model: Some(Some(model.into())),
            ..Default::default()
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(Some(instructions.into()));
        self
    }

    pub fn with_tool_resources(mut self, resources: ToolResources) -> Self {
        self.tool_resources = Some(Some(resources));
        self
    }

    /// Checks shared by create and update
    pub fn validate(&self) -> Result<()> {
        match self.resources() {
            Some(resources) => resources.validate(),
            None => Ok(()),
        }
    }

    /// Create additionally needs a name and a model
    pub fn validate_for_create(&self) -> Result<()> {
        if is_blank(&self.name) {
            return Err(UpstreamError::InvalidPayload("name is required".to_string()));
        }
        if is_blank(&self.model) {
            return Err(UpstreamError::InvalidPayload("model is required".to_string()));
        }
        self.validate()
    }

    pub fn inject_connection_id(&mut self, connection_id: &str) {
        if let Some(resources) = self.tool_resources.as_mut().and_then(Option::as_mut) {
            resources.inject_connection_id(connection_id);
        }
    }

    /// Normalise a create body: the agent service expects a tool list, so an
    /// absent or `null` one becomes `[]`
    pub fn into_create_body(mut self) -> Self {
        if !matches!(self.tools, Some(Some(_))) {
            self.tools = Some(Some(Vec::new()));
        }
        self
    }

    fn resources(&self) -> Option<&ToolResources> {
        self.tool_resources.as_ref().and_then(Option::as_ref)
    }
}

fn is_blank(value: &Option<Option<String>>) -> bool {
    value
        .as_ref()
        .and_then(Option::as_deref)
        .map(str::trim)
        .map_or(true, str::is_empty)
}
