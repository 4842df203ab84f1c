/// Configuration utilities: loading, global access and persistence
use super::schemas::Config;
use crate::errors::ConfigError;
use crate::logger::{self, LogTag};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::path::Path;

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/mist.toml";

/// Load configuration from the default path into the global CONFIG
pub fn load_config() -> Result<(), ConfigError> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Load configuration from a specific file path
///
/// A missing file is not an error: defaults are used and a warning is logged.
pub fn load_config_from_path(path: &str) -> Result<(), ConfigError> {
    let config = read_config_file(path)?;

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| ConfigError::AlreadyInitialized)
}

/// Parse a config file without touching the global instance
pub fn read_config_file(path: &str) -> Result<Config, ConfigError> {
    if !Path::new(path).exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path),
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;

    Config::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when `load_config` was never called, so library
/// code can read settings in tests without global setup.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get() {
        Some(lock) => f(&lock.read()),
        None => f(&Config::default()),
    }
}

/// Clone of the entire configuration (for use across await points)
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

/// Write the current configuration to disk
pub fn save_config(path: Option<&str>) -> Result<(), String> {
    let path = path.unwrap_or(CONFIG_FILE_PATH);

    let config_str = with_config(|cfg| {
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))
    })?;

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }
    }

    std::fs::write(path, config_str)
        .map_err(|e| format!("Failed to write config file '{}': {}", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = read_config_file("does/not/exist/mist.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_error_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[webserver\nport = ").unwrap();

        let err = read_config_file(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_reads_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mist.toml");
        std::fs::write(&path, "[websocket]\nsend_buffer = 8\n").unwrap();

        let config = read_config_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.websocket.send_buffer, 8);
    }
}
