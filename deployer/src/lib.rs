//! Deployer Library
//!
//! Webhook-triggered deployment dispatcher: loads `<deployment>.conf`, checks
//! method and secret, serializes runs with a file lock and executes the
//! configured command.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod server;
pub mod storage;
pub mod utils;
