use std::sync::Arc;

use anyhow::Result;

use histbridge_core::api::{
    Clock, Dispatcher, HistoryWriter, LoadedConfig, Poller, StoreConnector, Watermark,
};

use crate::store::SqliteConnector;

pub fn build_connector(loaded: &LoadedConfig) -> Arc<dyn StoreConnector> {
    Arc::new(SqliteConnector::new(
        loaded.paths.store_path.clone(),
        loaded.cfg.store.schema.clone(),
    ))
}

pub fn build_history_writer(loaded: &LoadedConfig, clock: Arc<dyn Clock>) -> Result<Arc<HistoryWriter>> {
    let writer = HistoryWriter::new(
        loaded.paths.history_dir.clone(),
        loaded.cfg.history.extension.clone(),
        clock,
    )?;
    Ok(Arc::new(writer))
}

/// Wires store, history writer and poller into an idle dispatcher. The
/// watermark starts at the clock's current time.
pub fn build_dispatcher(loaded: &LoadedConfig, clock: Arc<dyn Clock>) -> Result<Dispatcher> {
    let writer = build_history_writer(loaded, clock.clone())?;
    let poller = Poller::new(
        build_connector(loaded),
        writer.clone(),
        Watermark::new(clock.now()),
        loaded.cfg.store.batch_size,
    );
    Ok(Dispatcher::new(
        loaded.cfg.server.clone(),
        writer,
        poller,
        loaded.cfg.poller.interval(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use histbridge_core::api::{AppConfig, SystemClock};
    use histbridge_core::config::resolve_paths;

    fn loaded_in(dir: &std::path::Path) -> LoadedConfig {
        let cfg = AppConfig::default();
        let home = dir.to_path_buf();
        let opencode_dir = home.join(".opencode");
        let pai_dir = opencode_dir.join("pai");
        let paths = resolve_paths(&cfg, home, opencode_dir, pai_dir);
        LoadedConfig { cfg, paths }
    }

    #[test]
    fn history_directory_is_created_when_wiring() {
        let tmp = tempfile::tempdir().unwrap();
        let loaded = loaded_in(tmp.path());
        let writer = build_history_writer(&loaded, Arc::new(SystemClock)).unwrap();
        assert!(writer.dir().is_dir());
        assert!(writer.dir().ends_with("pai/history/sessions"));
    }

    #[tokio::test]
    async fn dispatcher_starts_idle() {
        let tmp = tempfile::tempdir().unwrap();
        let loaded = loaded_in(tmp.path());
        let mut dispatcher = build_dispatcher(&loaded, Arc::new(SystemClock)).unwrap();
        assert!(!dispatcher.is_polling());
        assert_eq!(
            build_connector(&loaded).location(),
            loaded.paths.store_path.display().to_string()
        );
        dispatcher.shutdown().await;
    }
}
