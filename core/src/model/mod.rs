mod record;
mod watermark;

pub use record::{ContentPart, ConversationRecord, MessageContent, MessageEntry};
pub use watermark::Watermark;
