use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One conversation as read from the source store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub messages: Vec<MessageEntry>,
}

impl ConversationRecord {
    pub fn display_id(&self) -> &str {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    #[serde(default = "default_role", deserialize_with = "role_or_unknown")]
    pub role: String,

    #[serde(default, deserialize_with = "content_or_empty")]
    pub content: MessageContent,
}

fn default_role() -> String {
    "unknown".to_string()
}

fn role_or_unknown<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_role))
}

fn content_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<MessageContent, D::Error> {
    Ok(Option::<MessageContent>::deserialize(d)?.unwrap_or_default())
}

impl MessageEntry {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: MessageContent::Text(content.into()),
        }
    }
}

/// Message body: plain text, a list of typed parts, or any other JSON shape
/// (rendered as empty text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    Other(Value),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl MessageContent {
    /// Plain-text rendering; parts without text are dropped.
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
            MessageContent::Other(_) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_accept_text_and_part_lists() {
        let raw = r#"[
            {"role": "user", "content": "hi"},
            {"role": "assistant", "content": [
                {"type": "text", "text": "hello"},
                {"type": "tool_use"},
                {"type": "text", "text": "there"}
            ]},
            {"content": "no role"}
        ]"#;
        let msgs: Vec<MessageEntry> = serde_json::from_str(raw).unwrap();
        assert_eq!(msgs[0].content.to_text(), "hi");
        assert_eq!(msgs[1].content.to_text(), "hello\nthere");
        assert_eq!(msgs[2].role, "unknown");
    }

    #[test]
    fn null_role_and_content_keep_the_message() {
        let raw = r#"[
            {"role": "user", "content": "hi"},
            {"role": "assistant", "content": null},
            {"role": null, "content": {"tool": "ls"}}
        ]"#;
        let msgs: Vec<MessageEntry> = serde_json::from_str(raw).unwrap();
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0].content.to_text(), "hi");
        assert_eq!(msgs[1].role, "assistant");
        assert_eq!(msgs[1].content.to_text(), "");
        assert_eq!(msgs[2].role, "unknown");
        assert_eq!(msgs[2].content.to_text(), "");
    }

    #[test]
    fn blank_id_displays_as_unknown() {
        let rec = ConversationRecord {
            id: Some("  ".into()),
            title: None,
            updated_at: Utc::now(),
            messages: vec![],
        };
        assert_eq!(rec.display_id(), "unknown");
    }
}
