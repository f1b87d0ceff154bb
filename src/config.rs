//! Configuration for the literate-diff front-end
//!
//! Loads user configuration from ~/.literate-diff/config.toml

use literate_diff::debounce::DEFAULT_WINDOW;
use literate_diff::share::DEFAULT_PREFIX;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where sequences are stored
    pub backend: Backend,
    /// SQLite database path (default: <config dir>/literate-diff/diffs.db)
    pub db_path: Option<PathBuf>,
    /// Base URL of the REST backend
    pub api_url: String,
    /// Proxy used to fetch pull request diffs; fetched directly when unset
    pub diff_proxy: Option<String>,
    /// Quiet window before a save, in milliseconds
    pub debounce_ms: u64,
    pub share_prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Http,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Sqlite
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            db_path: None,
            api_url: "http://localhost:3500".to_string(),
            diff_proxy: None,
            debounce_ms: DEFAULT_WINDOW.as_millis() as u64,
            share_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from default path (~/.literate-diff/config.toml)
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".literate-diff")
            .join("config.toml")
    }

    /// Merge CLI overrides into config
    pub fn with_overrides(
        mut self,
        backend: Option<Backend>,
        db_path: Option<PathBuf>,
        api_url: Option<String>,
    ) -> Self {
        if let Some(backend) = backend {
            self.backend = backend;
        }
        if let Some(path) = db_path {
            self.db_path = Some(path);
        }
        if let Some(url) = api_url {
            self.api_url = url;
        }
        self
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.debounce_window(), Duration::from_millis(1000));
    }

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend = \"http\"\ndebounce_ms = 250\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.backend, Backend::Http);
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.api_url, "http://localhost:3500");
        assert_eq!(config.share_prefix, "/literate-diffs");
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend = \"ftp\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(
            Some(Backend::Http),
            Some(PathBuf::from("/tmp/x.db")),
            None,
        );
        assert_eq!(config.backend, Backend::Http);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(config.api_url, "http://localhost:3500");
    }
}
