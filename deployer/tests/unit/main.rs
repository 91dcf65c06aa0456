//! Integration tests for the deployer HTTP surface

mod test_concurrency;
mod test_dispatcher;
