use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub poller: PollerConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr. Stdout is reserved for protocol responses.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory`.
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "histbridge_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses `<pai_dir>/logs`.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// How the update-time column is stored in the source database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// TEXT column holding RFC 3339 timestamps.
    Rfc3339,
    /// INTEGER column holding milliseconds since the Unix epoch.
    UnixMillis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the conversation database. Resolved at load time when unset.
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default)]
    pub schema: StoreSchema,
}

fn default_batch_size() -> usize {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            batch_size: default_batch_size(),
            schema: StoreSchema::default(),
        }
    }
}

/// Table and column names of the source database. The host application owns
/// this schema, so every name here can be overridden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSchema {
    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_id_column")]
    pub id_column: String,

    #[serde(default = "default_updated_at_column")]
    pub updated_at_column: String,

    #[serde(default = "default_messages_column")]
    pub messages_column: String,

    /// Optional; set to an empty string when the table has no title column.
    #[serde(default = "default_title_column")]
    pub title_column: Option<String>,

    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: TimestampFormat,
}

fn default_table() -> String {
    "conversations".to_string()
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_updated_at_column() -> String {
    "updated_at".to_string()
}

fn default_messages_column() -> String {
    "messages".to_string()
}

fn default_title_column() -> Option<String> {
    Some("title".to_string())
}

fn default_timestamp_format() -> TimestampFormat {
    TimestampFormat::Rfc3339
}

impl Default for StoreSchema {
    fn default() -> Self {
        Self {
            table: default_table(),
            id_column: default_id_column(),
            updated_at_column: default_updated_at_column(),
            messages_column: default_messages_column(),
            title_column: default_title_column(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Output directory. Resolved at load time when unset.
    #[serde(default)]
    pub directory: Option<String>,

    /// File extension for the per-day log files, without the dot.
    #[serde(default = "default_history_extension")]
    pub extension: String,
}

fn default_history_extension() -> String {
    "md".to_string()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            directory: None,
            extension: default_history_extension(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
}

/// Floor for `interval_ms`; smaller values are raised to this.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

fn default_poll_interval_ms() -> u64 {
    30_000
}

impl PollerConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Metadata advertised in the `initialize` reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_name")]
    pub name: String,

    #[serde(default = "default_server_version")]
    pub version: String,

    #[serde(default = "default_server_description")]
    pub description: String,

    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
}

fn default_server_name() -> String {
    "PAI History".to_string()
}

fn default_server_version() -> String {
    "1.0.0".to_string()
}

fn default_server_description() -> String {
    "Automatic conversation history tracking".to_string()
}

fn default_capabilities() -> Vec<String> {
    vec!["history-tracking".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            version: default_server_version(),
            description: default_server_description(),
            capabilities: default_capabilities(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.store.batch_size, 10);
        assert_eq!(cfg.poller.interval_ms, 30_000);
        assert_eq!(cfg.history.extension, "md");
        assert_eq!(cfg.store.schema.table, "conversations");
        assert_eq!(cfg.store.schema.timestamp_format, TimestampFormat::Rfc3339);
        assert_eq!(cfg.server.capabilities, vec!["history-tracking"]);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
[store]
batch_size = 25

[store.schema]
table = "sessions"
timestamp_format = "unix_millis"

[poller]
interval_ms = 5000
"#,
        )
        .unwrap();
        assert_eq!(cfg.store.batch_size, 25);
        assert_eq!(cfg.store.schema.table, "sessions");
        assert_eq!(cfg.store.schema.id_column, "id");
        assert_eq!(
            cfg.store.schema.timestamp_format,
            TimestampFormat::UnixMillis
        );
        assert_eq!(cfg.poller.interval_ms, 5000);
        assert_eq!(cfg.server.name, "PAI History");
    }

    #[test]
    fn poll_interval_has_a_floor() {
        let cfg = PollerConfig { interval_ms: 1 };
        assert_eq!(
            cfg.interval(),
            std::time::Duration::from_millis(MIN_POLL_INTERVAL_MS)
        );
    }
}
