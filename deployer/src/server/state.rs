//! Server state

use std::sync::Arc;

use crate::storage::config_store::ConfigStore;

/// Server state shared across handlers. Built once at startup, read-only.
pub struct ServerState {
    pub config_store: Arc<ConfigStore>,
}

impl ServerState {
    pub fn new(config_store: Arc<ConfigStore>) -> Self {
        Self { config_store }
    }
}
