//! Configuration management for Cachet

pub mod schema;

pub use schema::Config;

use crate::error::{CachetError, CachetResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Project-local config file name
pub const LOCAL_CONFIG_NAME: &str = ".cachet.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cachet")
            .join("config.toml")
    }

    /// Find a project-local config by walking up from a directory
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            let candidate = current.join(LOCAL_CONFIG_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = current.parent();
        }
        None
    }

    /// Load configuration, using defaults when the file is absent
    pub async fn load(&self) -> CachetResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> CachetResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CachetError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| CachetError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load global config, then overlay a local config when present.
    ///
    /// The local file replaces whole sections, matching how a project
    /// pins its own build patterns or thresholds.
    pub async fn load_merged(&self, local: Option<&Path>) -> CachetResult<Config> {
        let global = self.load().await?;
        let Some(local_path) = local else {
            return Ok(global);
        };

        debug!("Merging local config {}", local_path.display());
        let local_content = fs::read_to_string(local_path).await.map_err(|e| {
            CachetError::io(format!("reading local config {}", local_path.display()), e)
        })?;

        let global_value = toml::Value::try_from(&global)?;
        let local_value: toml::Value =
            toml::from_str(&local_content).map_err(|e| CachetError::ConfigInvalid {
                path: local_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let merged = merge_values(global_value, local_value);
        merged.try_into().map_err(|e: toml::de::Error| CachetError::ConfigInvalid {
            path: local_path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> CachetResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            CachetError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> CachetResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CachetError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Overlay `local` onto `global`, table by table
fn merge_values(global: toml::Value, local: toml::Value) -> toml::Value {
    match (global, local) {
        (toml::Value::Table(mut base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            toml::Value::Table(base)
        }
        (_, local) => local,
    }
}
