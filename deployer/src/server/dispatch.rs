//! Request pipeline: config → access check → lock → run

use axum::body::Body;
use axum::http::HeaderMap;
use futures::StreamExt;
use tracing::{debug, error, warn};

use crate::deploy::fsm::{DispatchEvent, DispatchFsm};
use crate::deploy::{lock, policy, runner};
use crate::errors::ConfigError;
use crate::models::deployment::{DeploymentConfig, MAX_SECRET_SIZE};
use crate::storage::config_store::ConfigStore;

/// Final non-empty segment of a request path
pub fn deployment_name(path: &str) -> Option<&str> {
    path.split('/').rev().find(|s| !s.is_empty())
}

/// Read at most `MAX_SECRET_SIZE` bytes of the body
async fn read_body_secret(body: Body) -> Result<String, ConfigError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::with_capacity(MAX_SECRET_SIZE);

    while buf.len() < MAX_SECRET_SIZE {
        match stream.next().await {
            Some(Ok(chunk)) => {
                let take = chunk.len().min(MAX_SECRET_SIZE - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Some(Err(e)) => {
                warn!("Cannot read request body: {}", e);
                return Err(ConfigError::PreconditionsError("Body is empty".to_string()));
            }
            None => break,
        }
    }

    if buf.is_empty() {
        return Err(ConfigError::PreconditionsError("Body is empty".to_string()));
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Secret presented by the request, or `None` when the deployment needs none.
///
/// With `secret-header` configured the header is taken verbatim; a missing
/// header presents no secret. Otherwise the body is the secret.
pub async fn extract_secret(
    config: &DeploymentConfig,
    headers: &HeaderMap,
    body: Body,
) -> Result<Option<String>, ConfigError> {
    if config.secret.is_none() {
        return Ok(None);
    }

    match &config.secret_header {
        Some(header) => Ok(headers
            .get(header.as_str())
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())),
        None => read_body_secret(body).await.map(Some),
    }
}

fn transition(fsm: &mut DispatchFsm, event: DispatchEvent) -> Result<(), ConfigError> {
    fsm.process(event).map_err(|e| {
        error!("Dispatch state machine rejected a step: {}", e);
        ConfigError::ExecutionError(format!("Invalid dispatch state: {}", e))
    })
}

fn step<T>(
    fsm: &mut DispatchFsm,
    result: Result<T, ConfigError>,
    event: DispatchEvent,
) -> Result<T, ConfigError> {
    let outcome = match result {
        Ok(value) => {
            transition(fsm, event)?;
            Ok(value)
        }
        Err(e) => {
            transition(fsm, DispatchEvent::Fail(e.clone()))?;
            debug!("Dispatch stopped: {:?}", fsm.error());
            Err(e)
        }
    };
    debug!("Dispatch state: {:?}", fsm.state());
    outcome
}

/// Lock and run the deployment on its own task.
///
/// The task owns both the lock and the child process, so a dropped request
/// cannot release the lock while the command is still running. The outer
/// result is the lock outcome, the inner one the command outcome.
async fn execute(config: DeploymentConfig) -> Result<Result<String, ConfigError>, ConfigError> {
    let task = tokio::spawn(async move {
        let handle = lock::acquire(&config).await?;
        Ok::<_, ConfigError>(runner::run(&config, handle).await)
    });

    task.await.unwrap_or_else(|e| {
        warn!("Deployment task failed: {}", e);
        Err(ConfigError::ExecutionError(format!("Deployment task failed: {}", e)))
    })
}

/// Drive one request for deployment `name` through the whole pipeline
pub async fn dispatch(
    store: &ConfigStore,
    name: &str,
    method: &str,
    headers: &HeaderMap,
    body: Body,
) -> Result<(), ConfigError> {
    let mut fsm = DispatchFsm::new();

    let config = step(&mut fsm, store.open(name).await, DispatchEvent::ConfigLoaded)?;

    let authorized = match extract_secret(&config, headers, body).await {
        Ok(secret) => policy::check(&config, method, secret.as_deref()),
        Err(e) => Err(e),
    };
    step(&mut fsm, authorized, DispatchEvent::Authorized)?;

    let ran = step(&mut fsm, execute(config).await, DispatchEvent::Locked)?;
    step(&mut fsm, ran, DispatchEvent::Executed)?;

    transition(&mut fsm, DispatchEvent::Respond)?;
    if !fsm.is_terminal() {
        return Err(ConfigError::ExecutionError(format!(
            "Dispatch ended in {:?}",
            fsm.state()
        )));
    }
    Ok(())
}
