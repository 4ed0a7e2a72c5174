//! Unified error types for the brewer control core.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! lifecycle façade handles failures uniformly. All variants are `Copy`.

use core::fmt;

use crate::aggregator::LifecycleState;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A lifecycle operation was called in the wrong state.
    Lifecycle(LifecycleError),
    /// Configuration is invalid or could not be parsed.
    Config(&'static str),
    /// A worker thread could not be created. Carries the thread name.
    Spawn(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lifecycle(e) => write!(f, "lifecycle: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Spawn(name) => write!(f, "spawn: could not start thread '{name}'"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Lifecycle errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    /// The aggregator was already started.
    AlreadyRunning,
    /// The aggregator is stopped; stopped is terminal.
    Stopped,
    /// The coffee maker is already switched on.
    AlreadyOn,
}

impl LifecycleError {
    /// The error a `start` attempt yields from a non-`Created` state.
    pub(crate) fn on_start(state: LifecycleState) -> Self {
        match state {
            LifecycleState::Stopped => Self::Stopped,
            LifecycleState::Created | LifecycleState::Running => Self::AlreadyRunning,
        }
    }
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "aggregator already running"),
            Self::Stopped => write!(f, "aggregator stopped"),
            Self::AlreadyOn => write!(f, "coffee maker already switched on"),
        }
    }
}

impl From<LifecycleError> for Error {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
