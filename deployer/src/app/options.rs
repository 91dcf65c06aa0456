//! Application configuration options

use std::collections::HashMap;
use std::path::PathBuf;

use crate::errors::DeployerError;
use crate::logs::{LogLevel, LogOptions};

/// Environment variable naming the config directory when `--configdir` is absent
pub const CONFIG_DIR_ENV: &str = "DEPLOYER_CONFIG";

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Server configuration
    pub server: ServerOptions,

    /// Directory holding `<deployment>.conf` files
    pub config_dir: PathBuf,

    /// Logging configuration
    pub logging: LogOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            server: ServerOptions::default(),
            config_dir: PathBuf::from("."),
            logging: LogOptions::default(),
        }
    }
}

impl AppOptions {
    /// Build options from `--key=value` flags.
    ///
    /// `env_config_dir` is the value of `DEPLOYER_CONFIG`, used when no
    /// `--configdir` flag is given.
    pub fn from_args(
        args: &HashMap<String, String>,
        env_config_dir: Option<String>,
    ) -> Result<Self, DeployerError> {
        let mut options = Self::default();

        if let Some(port) = args.get("port") {
            options.server.port = port
                .parse()
                .map_err(|_| DeployerError::ConfigError(format!("Invalid port: {}", port)))?;
        }
        if let Some(host) = args.get("host") {
            options.server.host = host.clone();
        }

        if let Some(dir) = args.get("configdir") {
            options.config_dir = PathBuf::from(dir);
        } else if let Some(dir) = env_config_dir.filter(|d| !d.is_empty()) {
            options.config_dir = PathBuf::from(dir);
        }

        if let Some(level) = args.get("log-level") {
            options.logging.log_level = level
                .parse::<LogLevel>()
                .map_err(DeployerError::ConfigError)?;
        }
        if args.contains_key("json-logs") {
            options.logging.json_format = true;
        }
        if let Some(dir) = args.get("log-dir") {
            options.logging.log_dir = Some(PathBuf::from(dir));
        }

        Ok(options)
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
        }
    }
}
