//! Application configuration management.
//!
//! Settings are layered with figment:
//! defaults < `config.toml` < `BINGOBOARD_*` environment variables < CLI flags.
//! Nested keys use a double underscore in the environment, e.g.
//! `BINGOBOARD_REMOTE__UPLOAD_CLIENT_ID`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CAPACITY;

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "BINGOBOARD_";

/// Settings for the wiki search API and the image host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// MediaWiki `api.php` endpoint.
    pub wiki_endpoint: String,
    pub user_agent: String,
    /// Maximum number of search results requested.
    pub search_limit: u32,
    pub timeout_secs: u64,
    /// Image host upload endpoint.
    pub upload_endpoint: String,
    /// Image host client id; uploads are disabled without one.
    pub upload_client_id: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            wiki_endpoint: "https://oldschool.runescape.wiki/api.php".to_string(),
            user_agent: format!(
                "OsrsBingoCreator/1.0 (bingoboard {}; Contact: UserRequest)",
                env!("CARGO_PKG_VERSION")
            ),
            search_limit: 15,
            timeout_secs: 20,
            upload_endpoint: "https://api.imgur.com/3/image".to_string(),
            upload_client_id: None,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Image cache directory; the platform default when unset.
    pub cache_dir: Option<PathBuf>,
    /// Image cache bound in bytes.
    pub cache_capacity: u64,
    /// Threads for background image work (0 = one per CPU).
    pub worker_threads: usize,
    pub remote: RemoteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            cache_capacity: DEFAULT_CAPACITY,
            worker_threads: 2,
            remote: RemoteConfig::default(),
        }
    }
}

impl Config {
    /// Load from the platform config file and the environment.
    ///
    /// Any error falls back to defaults; configuration problems never stop
    /// the application.
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Ok(path) => path,
            Err(e) => {
                log::debug!("No config directory, using defaults: {}", e);
                return Self::figment(None).extract().unwrap_or_default();
            }
        };

        match Self::load_from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load from an explicit TOML file (if it exists) and the environment.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        Self::figment(Some(path))
            .extract()
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Platform-specific configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "bingoboard", "bingoboard")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Image cache directory, shared with earlier releases by default.
    pub fn cache_root(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        let base = BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("Failed to determine local data directory"))?;
        Ok(base
            .data_local_dir()
            .join("OsrsBingoCreator")
            .join("WikiImageCache"))
    }
}
