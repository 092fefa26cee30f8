use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::AppConfig;

pub const CONFIG_FILE_NAME: &str = "histbridge.toml";

/// Filesystem locations derived once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub home: PathBuf,
    pub opencode_dir: PathBuf,
    pub pai_dir: PathBuf,
    pub store_path: PathBuf,
    pub history_dir: PathBuf,
    pub log_dir: PathBuf,
}

/// A loaded config together with the paths it resolves to.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub cfg: AppConfig,
    pub paths: ResolvedPaths,
}

/// Home directory: `HOME`, then `USERPROFILE`, then the platform default.
pub fn get_home_dir() -> anyhow::Result<PathBuf> {
    if let Some(home) = non_empty_env("HOME").or_else(|| non_empty_env("USERPROFILE")) {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))
}

/// `PAI_DIR` when set, otherwise `<opencode_dir>/pai`.
pub fn get_pai_dir(opencode_dir: &Path) -> PathBuf {
    match non_empty_env("PAI_DIR") {
        Some(dir) => expand_path(&dir),
        None => opencode_dir.join("pai"),
    }
}

pub fn load_default() -> anyhow::Result<LoadedConfig> {
    load_from(None)
}

/// Priority: explicit path, `<pai_dir>/histbridge.toml`, `./histbridge.toml`, defaults.
/// Environment overrides are applied on top.
pub fn load_from(explicit: Option<&Path>) -> anyhow::Result<LoadedConfig> {
    let home = get_home_dir()?;
    let opencode_dir = home.join(".opencode");
    let pai_dir = get_pai_dir(&opencode_dir);

    let pai_config = pai_dir.join(CONFIG_FILE_NAME);
    let local_config = Path::new(CONFIG_FILE_NAME);

    let mut cfg = if let Some(path) = explicit {
        read_config_file(path)?
    } else if pai_config.exists() {
        read_config_file(&pai_config)?
    } else if local_config.exists() {
        read_config_file(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg)?;

    let paths = resolve_paths(&cfg, home, opencode_dir, pai_dir);
    Ok(LoadedConfig { cfg, paths })
}

fn read_config_file(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str::<AppConfig>(&s)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn apply_env_overrides(cfg: &mut AppConfig) -> anyhow::Result<()> {
    if let Some(v) = non_empty_env("HISTBRIDGE_STORE_PATH") {
        cfg.store.path = Some(v);
    }
    if let Some(v) = non_empty_env("HISTBRIDGE_HISTORY_DIR") {
        cfg.history.directory = Some(v);
    }
    if let Some(v) = non_empty_env("HISTBRIDGE_POLL_INTERVAL_MS") {
        cfg.poller.interval_ms = v
            .trim()
            .parse()
            .with_context(|| format!("HISTBRIDGE_POLL_INTERVAL_MS is not a number: {v}"))?;
    }
    if let Some(v) = non_empty_env("HISTBRIDGE_BATCH_SIZE") {
        cfg.store.batch_size = v
            .trim()
            .parse()
            .with_context(|| format!("HISTBRIDGE_BATCH_SIZE is not a number: {v}"))?;
    }
    Ok(())
}

/// Fills in the store path, history directory and log directory.
pub fn resolve_paths(
    cfg: &AppConfig,
    home: PathBuf,
    opencode_dir: PathBuf,
    pai_dir: PathBuf,
) -> ResolvedPaths {
    let store_path = configured_path(cfg.store.path.as_deref())
        .unwrap_or_else(|| opencode_dir.join("conversations.db"));
    let history_dir = configured_path(cfg.history.directory.as_deref())
        .unwrap_or_else(|| pai_dir.join("history").join("sessions"));
    let log_dir =
        configured_path(cfg.logging.directory.as_deref()).unwrap_or_else(|| pai_dir.join("logs"));

    ResolvedPaths {
        home,
        opencode_dir,
        pai_dir,
        store_path,
        history_dir,
        log_dir,
    }
}

fn configured_path(value: Option<&str>) -> Option<PathBuf> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(expand_path)
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
