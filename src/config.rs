//! Configuration file handling
//!
//! The config is a small TOML file naming the database and the log source.
//! A missing file is written out with defaults on first use.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "logsift.toml";

/// Prefix accepted in front of a database path
const SQLITE_SCHEME: &str = "sqlite:///";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database location, optionally prefixed with `sqlite:///`
    pub uri: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: format!("{SQLITE_SCHEME}logs.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    pub directory: PathBuf,
    pub filename: String,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            filename: "access.log".to_string(),
        }
    }
}

impl Config {
    /// Load the config at `path`, writing the defaults there if it does not exist
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        let config = Self::default();
        config.save(path)?;
        tracing::info!(path = %path.display(), "wrote default configuration");
        Ok(config)
    }

    /// Load the config at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Write the config to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("failed to write config {}", path.display()))
    }

    /// Database file path with any `sqlite:///` prefix removed
    pub fn database_path(&self) -> PathBuf {
        let uri = self.database.uri.as_str();
        PathBuf::from(uri.strip_prefix(SQLITE_SCHEME).unwrap_or(uri))
    }

    /// Full path of the access log to ingest
    pub fn log_path(&self) -> PathBuf {
        self.logs.directory.join(&self.logs.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database_path(), PathBuf::from("logs.db"));
        assert_eq!(config.log_path(), Path::new("logs").join("access.log"));
    }

    #[test]
    fn test_database_uri_without_scheme() {
        let mut config = Config::default();
        config.database.uri = "/var/lib/logsift/logs.db".to_string();
        assert_eq!(config.database_path(), PathBuf::from("/var/lib/logsift/logs.db"));

        config.database.uri = "sqlite:///data/logs.db".to_string();
        assert_eq!(config.database_path(), PathBuf::from("data/logs.db"));
    }

    #[test]
    fn test_load_or_init_bootstraps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("logsift.toml");

        let config = Config::load_or_init(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logsift.toml");
        fs::write(&path, "[logs]\nfilename = \"other.log\"\n").unwrap();

        let config = Config::load_or_init(&path).unwrap();
        assert_eq!(config.logs.filename, "other.log");
        assert_eq!(config.logs.directory, PathBuf::from("logs"));
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logsift.toml");
        fs::write(&path, "[database\nuri = 3").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
