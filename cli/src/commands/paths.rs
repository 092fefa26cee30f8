use histbridge_core::api::{CliError, LoadedConfig};

pub fn handle_paths(loaded: &LoadedConfig) -> Result<i32, CliError> {
    let paths = &loaded.paths;
    let out = serde_json::json!({
        "store_path": paths.store_path.display().to_string(),
        "history_dir": paths.history_dir.display().to_string(),
        "log_dir": paths.log_dir.display().to_string(),
        "pai_dir": paths.pai_dir.display().to_string(),
    });
    let line = serde_json::to_string_pretty(&out).map_err(|e| CliError::Command(e.to_string()))?;
    println!("{line}");
    Ok(0)
}
