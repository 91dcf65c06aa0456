//! Finite State Machine for a single deployment request

use crate::errors::ConfigError;

/// Dispatch state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchState {
    /// Request received
    Start,

    /// Config file read
    ConfigLoaded,

    /// Method and secret accepted
    Authorized,

    /// Execution lock held
    Locked,

    /// Command finished successfully
    Executed,

    /// Success response rendered
    Responded,

    /// Short-circuited with an error of the given kind
    Failed(&'static str),
}

/// Dispatch event
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    ConfigLoaded,
    Authorized,
    Locked,
    Executed,
    Respond,
    Fail(ConfigError),
}

/// Dispatch FSM
#[derive(Debug, Clone)]
pub struct DispatchFsm {
    state: DispatchState,
    error: Option<ConfigError>,
}

impl DispatchFsm {
    /// Create a new FSM in start state
    pub fn new() -> Self {
        Self {
            state: DispatchState::Start,
            error: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    /// Get the error that failed the request, if any
    pub fn error(&self) -> Option<&ConfigError> {
        self.error.as_ref()
    }

    /// Check if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, DispatchState::Responded | DispatchState::Failed(_))
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: DispatchEvent) -> Result<(), String> {
        let new_state = match (&self.state, event) {
            (DispatchState::Start, DispatchEvent::ConfigLoaded) => DispatchState::ConfigLoaded,
            (DispatchState::ConfigLoaded, DispatchEvent::Authorized) => DispatchState::Authorized,
            (DispatchState::Authorized, DispatchEvent::Locked) => DispatchState::Locked,
            (DispatchState::Locked, DispatchEvent::Executed) => DispatchState::Executed,
            (DispatchState::Executed, DispatchEvent::Respond) => DispatchState::Responded,

            // Any non-terminal state may fail
            (_, DispatchEvent::Fail(err)) if !self.is_terminal() => {
                let kind = err.kind();
                self.error = Some(err);
                DispatchState::Failed(kind)
            }

            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for DispatchFsm {
    fn default() -> Self {
        Self::new()
    }
}
