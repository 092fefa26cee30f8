//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `histbridge_core::api` instead of reaching into internal modules.

pub use crate::clock::{Clock, SystemClock};
pub use crate::config::{
    load_default, load_from, AppConfig, HistoryConfig, LoadedConfig, LoggingConfig, PollerConfig,
    ResolvedPaths, ServerConfig, StoreConfig, StoreSchema, TimestampFormat,
};
pub use crate::error::{CliError, HistoryError, ProtocolError, RpcErrorCode, StoreError};
pub use crate::history::{render_entry, DayLog, HistorySink, HistoryWriter, NO_MESSAGES};
pub use crate::model::{ContentPart, ConversationRecord, MessageContent, MessageEntry, Watermark};
pub use crate::poller::{PollTask, Poller, TickOutcome};
pub use crate::protocol::{Dispatcher, RequestDecoder, RpcRequest, RpcResponse};
pub use crate::store::{ConversationStore, StoreConnector};
