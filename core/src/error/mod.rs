#[allow(clippy::module_inception)]
pub mod error;
pub mod protocol;
pub mod store;

pub use error::CliError;
pub use protocol::{ProtocolError, RpcErrorCode};
pub use store::{HistoryError, StoreError};
