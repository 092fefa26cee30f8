use crate::error::StoreError;
use crate::model::{ConversationRecord, Watermark};

/// An open, read-only handle on the source conversation store.
pub trait ConversationStore: Send {
    fn name(&self) -> &str;

    /// Up to `limit` records updated strictly after `since`, newest first.
    fn fetch_since(
        &self,
        since: &Watermark,
        limit: usize,
    ) -> Result<Vec<ConversationRecord>, StoreError>;
}

/// Opens store handles. Called again on a later tick whenever opening fails
/// or a query error drops the current handle.
pub trait StoreConnector: Send + Sync {
    /// Human-readable location for logs, usually a file path.
    fn location(&self) -> String;

    fn open(&self) -> Result<Box<dyn ConversationStore>, StoreError>;
}
