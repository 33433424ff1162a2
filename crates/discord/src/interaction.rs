use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const INTERACTION_PING: u8 = 1;
pub const INTERACTION_APPLICATION_COMMAND: u8 = 2;

pub const RESPONSE_PONG: u8 = 1;
pub const RESPONSE_CHANNEL_MESSAGE: u8 = 4;
pub const RESPONSE_DEFERRED_CHANNEL_MESSAGE: u8 = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub data: Option<CommandData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
}

impl Interaction {
    /// Lower-cased command name, empty when absent.
    pub fn command_name(&self) -> String {
        self.data
            .as_ref()
            .map(|d| d.name.trim().to_lowercase())
            .unwrap_or_default()
    }

    /// Option value as text, matched case-insensitively by name.
    pub fn option_str(&self, name: &str) -> Option<String> {
        let opt = self
            .data
            .as_ref()?
            .options
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))?;

        match opt.value.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn option_or(&self, name: &str, default: &str) -> String {
        self.option_str(name)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MessageData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageData {
    pub content: String,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self { kind: RESPONSE_PONG, data: None }
    }

    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: RESPONSE_CHANNEL_MESSAGE,
            data: Some(MessageData { content: content.into() }),
        }
    }

    pub fn deferred() -> Self {
        Self { kind: RESPONSE_DEFERRED_CHANNEL_MESSAGE, data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_are_read_case_insensitively() {
        let i: Interaction = serde_json::from_value(json!({
            "type": 2,
            "application_id": "123",
            "token": "tok",
            "data": {
                "name": "Futures",
                "options": [
                    {"name": "sport", "type": 3, "value": "NBA"},
                    {"name": "Category", "type": 3, "value": "Team Futures"},
                    {"name": "week", "type": 4, "value": 3}
                ]
            }
        }))
        .unwrap();

        assert_eq!(i.command_name(), "futures");
        assert_eq!(i.option_str("SPORT").as_deref(), Some("NBA"));
        assert_eq!(i.option_or("category", "All"), "Team Futures");
        assert_eq!(i.option_str("week").as_deref(), Some("3"));
        assert_eq!(i.option_or("market", ""), "");
    }

    #[test]
    fn responses_serialize_to_wire_shape() {
        assert_eq!(serde_json::to_value(InteractionResponse::pong()).unwrap(), json!({"type": 1}));
        assert_eq!(serde_json::to_value(InteractionResponse::deferred()).unwrap(), json!({"type": 5}));
        assert_eq!(
            serde_json::to_value(InteractionResponse::message("🏓 Pong")).unwrap(),
            json!({"type": 4, "data": {"content": "🏓 Pong"}})
        );
    }

    #[test]
    fn ping_needs_no_data() {
        let i: Interaction = serde_json::from_value(json!({"type": 1})).unwrap();
        assert_eq!(i.kind, INTERACTION_PING);
        assert_eq!(i.command_name(), "");
    }
}
