//! HTTP request handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::errors::ConfigError;
use crate::server::dispatch::{deployment_name, dispatch};
use crate::server::state::ServerState;

/// Body of an error response: `Config <name> <kind>: <message>\n`
pub fn error_body(name: &str, err: &ConfigError) -> String {
    format!("Config {} {}\n", name, err)
}

/// `/incoming/<deployment>` handler
pub async fn incoming_handler(
    State(state): State<Arc<ServerState>>,
    method: Method,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let Some(name) = deployment_name(&path) else {
        let err = ConfigError::MissingConfig("No deployment name".to_string());
        return (err.status_code(), error_body("", &err)).into_response();
    };

    match dispatch(&state.config_store, name, method.as_str(), &headers, body).await {
        Ok(()) => {
            info!("Deployment {} finished", name);
            (StatusCode::OK, "OK").into_response()
        }
        Err(err) => {
            warn!("Deployment {} failed: {}", name, err);
            (err.status_code(), error_body(name, &err)).into_response()
        }
    }
}
