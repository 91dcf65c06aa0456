//! Deployment config lookup

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::ConfigError;
use crate::filesys::dir::Dir;
use crate::models::deployment::{DeploymentConfig, DeploymentFile};

/// Reads `<name>.conf` files from a base directory.
///
/// Nothing is cached: every call goes back to disk, so edits apply to the
/// next request.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    base_dir: Dir,
}

impl ConfigStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Dir::new(base_dir),
        }
    }

    pub fn base_dir(&self) -> &Path {
        self.base_dir.path()
    }

    /// Create an empty config rooted at the base directory.
    ///
    /// Fails with `MissingConfig` when the base directory is absent or is not
    /// a directory.
    pub async fn load(&self) -> Result<DeploymentConfig, ConfigError> {
        if !self.base_dir.exists().await {
            warn!("Config directory not found: {}", self.base_dir.path().display());
            return Err(ConfigError::MissingConfig("Path not found".to_string()));
        }
        Ok(DeploymentConfig::new(self.base_dir.path()))
    }

    /// Parse `<name>.conf` into `config`
    pub async fn read(&self, config: &mut DeploymentConfig, name: &str) -> Result<(), ConfigError> {
        config.config_name = format!("{}.conf", name);
        debug!("Reading {}", config.config_name);

        let file = self.base_dir.file(&config.config_name);
        let parsed: DeploymentFile = match file.read_toml().await {
            Ok(parsed) => parsed,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::MissingConfig(format!(
                    "{} does not exist",
                    config.config_name
                )));
            }
            Err(e) => {
                warn!("Error when reading config {}: {}", config.config_name, e);
                return Err(ConfigError::ReadError(e.to_string()));
            }
        };

        if parsed.commands.is_empty() {
            return Err(ConfigError::ReadError(format!(
                "{} has no commands",
                config.config_name
            )));
        }

        config.apply(parsed);
        Ok(())
    }

    /// `load` followed by `read`
    pub async fn open(&self, name: &str) -> Result<DeploymentConfig, ConfigError> {
        let mut config = self.load().await?;
        self.read(&mut config, name).await?;
        Ok(config)
    }
}
