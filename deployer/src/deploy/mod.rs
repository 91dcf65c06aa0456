//! Deployment module

pub mod fsm;
pub mod lock;
pub mod policy;
pub mod runner;
