//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info};

use crate::app::options::AppOptions;
use crate::errors::DeployerError;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::storage::config_store::ConfigStore;

/// Run the deployer until `shutdown_signal` resolves or the server fails
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DeployerError> {
    info!(
        "Starting with configuration: port: {}, config dir: {}",
        options.server.port,
        options.config_dir.display()
    );

    let config_store = Arc::new(ConfigStore::new(options.config_dir.clone()));
    let state = Arc::new(ServerState::new(config_store));

    let handle = serve(&options.server, state, shutdown_signal).await?;

    match handle.await {
        Ok(Ok(())) => {
            info!("Server stopped");
            Ok(())
        }
        Ok(Err(e)) => {
            error!("Server failed: {}", e);
            Err(e)
        }
        Err(e) => Err(DeployerError::ServerError(format!("Server task failed: {}", e))),
    }
}
