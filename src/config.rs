//! Layered configuration for the catalog daemon.
//!
//! Sources, lowest precedence first:
//! - Default values
//! - TOML configuration file (`catalogd.toml` or an explicit path)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CATALOGD_` and use double
//! underscores to separate nested levels:
//! - `CATALOGD_CATALOG_DIR=/srv/catalogs` sets `catalog_dir`
//! - `CATALOGD_WATCH__DEBOUNCE_MS=250` sets `watch.debounce_ms`
//! - `CATALOGD_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "catalogd.toml";
/// Base directory scanned for catalogs when none is configured.
pub const DEFAULT_CATALOG_DIR: &str = "./catalog";

const ENV_PREFIX: &str = "CATALOGD_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write configuration: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Directory whose direct subdirectories are catalogs
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,

    /// File watching configuration
    #[serde(default)]
    pub watch: WatchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatchConfig {
    /// Quiet period before a modification is delivered
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// File name pattern watched below each catalog's mapping directory
    #[serde(default = "default_mapping_pattern")]
    pub mapping_pattern: String,

    /// Queued event count that triggers a backlog warning
    #[serde(default = "default_backlog_warning")]
    pub backlog_warning: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level for every target without an override
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target level overrides, e.g. `catalogd::watcher = "debug"`
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_catalog_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CATALOG_DIR)
}
fn default_debounce_ms() -> u64 {
    500
}
pub(crate) fn default_mapping_pattern() -> String {
    r".*\.xmi".to_string()
}
fn default_backlog_warning() -> usize {
    100
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_dir: default_catalog_dir(),
            watch: WatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            mapping_pattern: default_mapping_pattern(),
            backlog_warning: default_backlog_warning(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from defaults, `catalogd.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration with a specific file in place of `catalogd.toml`.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore becomes a dot; single underscores stay in
            // field names.
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.catalog_dir, PathBuf::from("./catalog"));
        assert_eq!(settings.watch.debounce_ms, 500);
        assert_eq!(settings.watch.mapping_pattern, r".*\.xmi");
        assert_eq!(settings.watch.backlog_warning, 100);
        assert_eq!(settings.logging.default, "info");
        assert!(settings.logging.modules.is_empty());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("catalogd.toml");

        let toml_content = r#"
catalog_dir = "/srv/catalogs"

[watch]
backlog_warning = 16
mapping_pattern = ".*\\.xml"

[logging.modules]
"catalogd::watcher" = "trace"
"#;
        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.catalog_dir, PathBuf::from("/srv/catalogs"));
        assert_eq!(settings.watch.backlog_warning, 16);
        assert_eq!(settings.watch.mapping_pattern, r".*\.xml");
        assert_eq!(settings.logging.modules["catalogd::watcher"], "trace");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.watch.backlog_warning, 100);
        assert_eq!(settings.watch.mapping_pattern, r".*\.xmi");
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested/catalogd.toml");

        let mut settings = Settings::default();
        settings.catalog_dir = PathBuf::from("/data/catalogs");
        settings.watch.backlog_warning = 7;

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.catalog_dir, PathBuf::from("/data/catalogs"));
        assert_eq!(loaded.watch.backlog_warning, 7);
    }

    #[test]
    fn test_invalid_value_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("catalogd.toml");
        fs::write(&config_path, "[watch]\nbacklog_warning = \"many\"\n").unwrap();

        assert!(matches!(
            Settings::load_from(&config_path),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("catalogd.toml");
        fs::write(&config_path, "[watch]\ndebounce_ms = 800\n").unwrap();

        // Only this test touches these variables.
        unsafe {
            std::env::set_var("CATALOGD_WATCH__DEBOUNCE_MS", "250");
            std::env::set_var("CATALOGD_LOGGING__DEFAULT", "debug");
        }

        let settings = Settings::load_from(&config_path).unwrap();

        unsafe {
            std::env::remove_var("CATALOGD_WATCH__DEBOUNCE_MS");
            std::env::remove_var("CATALOGD_LOGGING__DEFAULT");
        }

        assert_eq!(settings.watch.debounce_ms, 250);
        assert_eq!(settings.logging.default, "debug");
    }
}
