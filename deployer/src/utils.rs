//! Utility functions

use std::collections::HashMap;

use serde::Serialize;

/// Version information for the deployer
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Collect `--key=value` and `--flag` arguments into a map
pub fn parse_flags<I: IntoIterator<Item = String>>(args: I) -> HashMap<String, String> {
    let mut flags = HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once('=') {
            flags.insert(key.trim_start_matches('-').to_string(), value.to_string());
        } else if arg.starts_with("--") {
            flags.insert(arg.trim_start_matches('-').to_string(), "true".to_string());
        }
    }

    flags
}
