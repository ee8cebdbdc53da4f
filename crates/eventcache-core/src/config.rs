//! Application configuration management.
//!
//! This module handles loading the application configuration:
//! the API base URL, the delivery mode for cached events, and an optional
//! cache directory override.
//!
//! Configuration is stored at `~/.config/eventcache/config.json`. The
//! `EVENTCACHE_API_URL` and `EVENTCACHE_CACHE_DIR` environment variables
//! take precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_BASE_URL;
use crate::client::DeliveryMode;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "eventcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const API_URL_ENV: &str = "EVENTCACHE_API_URL";
pub const CACHE_DIR_ENV: &str = "EVENTCACHE_CACHE_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    #[serde(default)]
    pub delivery: DeliveryMode,
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&Self::config_path()?)?;
        Ok(config.with_overrides(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(CACHE_DIR_ENV).ok(),
        ))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Non-empty override values replace what the file said
    pub fn with_overrides(mut self, base_url: Option<String>, cache_dir: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = Some(url);
        }
        if let Some(dir) = cache_dir.filter(|d| !d.trim().is_empty()) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        self
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.delivery, DeliveryMode::Eager);
    }

    #[test]
    fn test_load_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config {
            base_url: Some("http://localhost:3000".into()),
            delivery: DeliveryMode::Deferred,
            cache_dir: Some(dir.path().join("cache")),
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.base_url(), "http://localhost:3000");
        assert_eq!(loaded.delivery, DeliveryMode::Deferred);
        assert_eq!(loaded.cache_dir().unwrap(), dir.path().join("cache"));
    }

    #[test]
    fn test_delivery_parses_lowercase() {
        let config: Config = serde_json::from_str(r#"{"delivery": "deferred"}"#).unwrap();
        assert_eq!(config.delivery, DeliveryMode::Deferred);
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .with_overrides(Some("http://staging".into()), Some("  ".into()));
        assert_eq!(config.base_url(), "http://staging");
        assert!(config.cache_dir.is_none());

        let config = Config {
            base_url: Some("http://file".into()),
            ..Config::default()
        }
        .with_overrides(None, Some("/tmp/eventcache".into()));
        assert_eq!(config.base_url(), "http://file");
        assert_eq!(config.cache_dir.as_deref(), Some(Path::new("/tmp/eventcache")));
    }
}
