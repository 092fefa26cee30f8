pub mod format;
pub mod writer;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::HistoryError;
use crate::model::ConversationRecord;

pub use format::{render_entry, NO_MESSAGES};
pub use writer::{DayLog, HistoryWriter, MAX_LOOKBACK_DAYS};

/// Destination for formatted history entries.
#[async_trait]
pub trait HistorySink: Send + Sync {
    /// Appends one entry and returns the file it went to.
    async fn append(&self, record: &ConversationRecord) -> Result<PathBuf, HistoryError>;
}
