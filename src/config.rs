//! Brewer configuration parameters
//!
//! All tunable parameters for the control core.
//! Values can be loaded from JSON; missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Smallest worker stack accepted by [`BrewerConfig::validate`].
pub const MIN_STACK_KB: usize = 16;
/// Largest worker stack accepted by [`BrewerConfig::validate`] (64 MB).
pub const MAX_STACK_KB: usize = 64 * 1024;

/// Core brewer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrewerConfig {
    // --- Timing ---
    /// Sensor poll period (milliseconds)
    pub poll_interval_ms: u32,
    /// How long switch-off waits for in-flight handlers (milliseconds)
    pub shutdown_grace_ms: u32,

    // --- Threads ---
    /// Stack size of the aggregator dispatch thread (KB)
    pub dispatch_stack_kb: usize,
    /// Stack size of the poller thread (KB)
    pub poller_stack_kb: usize,
    /// Stack size of each handler thread spawned during fan-out (KB)
    pub handler_stack_kb: usize,
}

impl Default for BrewerConfig {
    fn default() -> Self {
        Self {
            // Timing
            poll_interval_ms: 1000, // 1 Hz
            shutdown_grace_ms: 500,

            // Threads
            dispatch_stack_kb: 32,
            poller_stack_kb: 32,
            handler_stack_kb: 32,
        }
    }
}

impl BrewerConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be non-zero"));
        }
        if self.dispatch_stack_kb < MIN_STACK_KB
            || self.poller_stack_kb < MIN_STACK_KB
            || self.handler_stack_kb < MIN_STACK_KB
        {
            return Err(Error::Config("thread stacks must be at least 16 KB"));
        }
        if self.dispatch_stack_kb > MAX_STACK_KB
            || self.poller_stack_kb > MAX_STACK_KB
            || self.handler_stack_kb > MAX_STACK_KB
        {
            return Err(Error::Config("thread stacks must be at most 64 MB"));
        }
        Ok(())
    }

    /// Poll period as a `Duration`.
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(u64::from(self.poll_interval_ms))
    }

    /// Shutdown grace period as a `Duration`.
    pub fn shutdown_grace(&self) -> std::time::Duration {
        std::time::Duration::from_millis(u64::from(self.shutdown_grace_ms))
    }
}
