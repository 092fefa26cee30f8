use chrono::{DateTime, SecondsFormat, Utc};

use crate::model::{ConversationRecord, MessageEntry};

pub const NO_MESSAGES: &str = "No messages";

/// Renders one history entry block. `written_at` is the wall-clock write time,
/// not the record's update time.
pub fn render_entry(record: &ConversationRecord, written_at: DateTime<Utc>) -> String {
    let timestamp = written_at.to_rfc3339_opts(SecondsFormat::Millis, true);
    format!(
        "\n## {timestamp}\n\n**Conversation ID:** {id}\n\n**Messages:**\n{messages}\n\n---\n",
        id = record.display_id(),
        messages = render_messages(&record.messages),
    )
}

fn render_messages(messages: &[MessageEntry]) -> String {
    if messages.is_empty() {
        return NO_MESSAGES.to_string();
    }
    messages
        .iter()
        .map(|m| format!("\n### {}\n{}\n", m.role, m.content.to_text()))
        .collect::<Vec<_>>()
        .join("\n")
}
