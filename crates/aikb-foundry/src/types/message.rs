use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Author of a thread message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    #[default]
    User,
    Assistant,
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("unsupported role: {}", other)),
        }
    }
}

/// Body for appending a message to a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    #[serde(default)]
    pub role: MessageRole,
    /// Plain text or an array of content parts
    pub content: Value,
}

impl NewMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Value::String(content.into()),
        }
    }
}

/// Body for starting a run; options other than the agent id pass through
///
/// An `assistant_id` among the options takes the place of the top-level
/// one, so the serialized body never carries the key twice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewRun {
    pub assistant_id: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl NewRun {
    pub fn new(assistant_id: impl Into<String>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            options: Map::new(),
        }
    }
}

impl Serialize for NewRun {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.options.contains_key("assistant_id") {
            map.serialize_entry("assistant_id", &self.assistant_id)?;
        }
        for (key, value) in &self.options {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_defaults_to_user() {
        let msg: NewMessage = serde_json::from_value(json!({"content": "hi"})).unwrap();
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(serde_json::to_value(&msg).unwrap(), json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(serde_json::from_value::<NewMessage>(json!({"role": "system", "content": "x"})).is_err());
    }

    #[test]
    fn test_run_options_flattened() {
        let mut run = NewRun::new("a1");
        run.options.insert("instructions".to_string(), json!("answer in French"));
        assert_eq!(
            serde_json::to_value(&run).unwrap(),
            json!({"assistant_id": "a1", "instructions": "answer in French"})
        );
    }

    #[test]
    fn test_run_option_replaces_assistant_id() {
        let mut run = NewRun::new("a1");
        run.options.insert("assistant_id".to_string(), json!("other"));
        assert_eq!(serde_json::to_string(&run).unwrap(), r#"{"assistant_id":"other"}"#);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("assistant".parse::<MessageRole>(), Ok(MessageRole::Assistant));
        assert_eq!("system".parse::<MessageRole>().unwrap_err(), "unsupported role: system");
    }
}
