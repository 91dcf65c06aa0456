//! Per-deployment execution lock
//!
//! Executions of one deployment are serialized with an exclusive `flock` on
//! `<deployment>.conf.lock` next to the config file. The lock is advisory and
//! file based, so it also holds across separate server processes sharing the
//! directory. Acquisition blocks with no timeout.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::errors::ConfigError;
use crate::models::deployment::DeploymentConfig;

/// Held lock on a deployment's lock file. Unlocks on `release` or drop.
#[derive(Debug)]
pub struct LockHandle {
    path: PathBuf,
    file: Option<File>,
}

impl LockHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlock now
    pub fn release(mut self) {
        self.unlock();
    }

    fn unlock(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = FileExt::unlock(&file) {
                warn!("Cannot unlock file: {}: {}", self.path.display(), e);
            } else {
                debug!("Released lock {}", self.path.display());
            }
        }
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        self.unlock();
    }
}

/// Open (creating if needed) and exclusively lock the deployment's lock file.
///
/// Blocks the calling thread until the lock is free.
pub fn acquire_blocking(path: &Path) -> Result<LockHandle, ConfigError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| {
            let msg = format!("Cannot open lock file: {}: {}", path.display(), e);
            warn!("{}", msg);
            ConfigError::ExecutionError(msg)
        })?;

    FileExt::lock_exclusive(&file).map_err(|e| {
        let msg = format!("Cannot lock file: {}: {}", path.display(), e);
        warn!("{}", msg);
        ConfigError::SetupError(msg)
    })?;

    debug!("Acquired lock {}", path.display());
    Ok(LockHandle {
        path: path.to_path_buf(),
        file: Some(file),
    })
}

/// Acquire the deployment's lock without stalling the async runtime
pub async fn acquire(config: &DeploymentConfig) -> Result<LockHandle, ConfigError> {
    let path = config.lock_path();
    tokio::task::spawn_blocking(move || acquire_blocking(&path))
        .await
        .map_err(|e| ConfigError::SetupError(format!("Lock task failed: {}", e)))?
}
