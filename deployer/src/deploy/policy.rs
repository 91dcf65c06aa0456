//! Access checks for incoming deployment requests

use crate::errors::ConfigError;
use crate::models::deployment::{DeploymentConfig, RequestMethod};

/// Check if the given request method may trigger this deployment
pub fn allows_method(config: &DeploymentConfig, method: &str) -> bool {
    let Some(method) = RequestMethod::parse(method) else {
        return false;
    };
    match &config.allowed_methods {
        Some(allowed) => allowed.contains(&method),
        None => RequestMethod::ALL.contains(&method),
    }
}

/// Check the provided secret. An unset secret accepts anything.
pub fn allows_secret(config: &DeploymentConfig, secret: Option<&str>) -> bool {
    match &config.secret {
        None => true,
        Some(expected) => secret == Some(expected.as_str()),
    }
}

/// Method check first, then secret
pub fn check(
    config: &DeploymentConfig,
    method: &str,
    secret: Option<&str>,
) -> Result<(), ConfigError> {
    if !allows_method(config, method) {
        return Err(ConfigError::PreconditionsError(
            "Method not allowed".to_string(),
        ));
    }
    if !allows_secret(config, secret) {
        return Err(ConfigError::PreconditionsError(
            "Secret mismatched".to_string(),
        ));
    }
    Ok(())
}
