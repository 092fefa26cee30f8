pub mod sqlite;

pub use sqlite::{SqliteConnector, SqliteConversationStore};
