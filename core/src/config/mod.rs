mod load;
mod types;

pub use load::{
    get_home_dir, get_pai_dir, load_default, load_from, resolve_paths, LoadedConfig,
    ResolvedPaths, CONFIG_FILE_NAME,
};
pub use types::{
    AppConfig, HistoryConfig, LoggingConfig, PollerConfig, ServerConfig, StoreConfig,
    StoreSchema, TimestampFormat, MIN_POLL_INTERVAL_MS,
};
