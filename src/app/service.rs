//! Lifecycle façade: the hexagonal core's single entry point.
//!
//! [`CoffeeMaker`] owns one switched-on session at a time: an
//! [`Aggregator`], the four controllers registered with it, and the
//! [`Poller`] feeding it. All hardware access flows through the port
//! traits passed to [`switch_on`](CoffeeMaker::switch_on).
//!
//! ```text
//!  QueryPort ──▶ Poller ──▶ ┌────────────────────┐
//!                           │     Aggregator      │──▶ Controllers ──▶ CommandPort
//!                           └────────────────────┘
//! ```
//!
//! A stopped aggregator cannot be restarted, so every `switch_on` builds
//! a fresh one.

use std::sync::Arc;

use log::{info, warn};

use crate::aggregator::Aggregator;
use crate::config::BrewerConfig;
use crate::controllers::Controllers;
use crate::error::{LifecycleError, Result};
use crate::poller::Poller;

use super::ports::HardwarePort;

// ───────────────────────────────────────────────────────────────
// Session
// ───────────────────────────────────────────────────────────────

/// Everything that exists only while the machine is on.
struct Session {
    aggregator: Arc<Aggregator>,
    poller: Poller,
}

// ───────────────────────────────────────────────────────────────
// CoffeeMaker
// ───────────────────────────────────────────────────────────────

pub struct CoffeeMaker {
    config: BrewerConfig,
    session: Option<Session>,
    /// Completed power cycles.
    cycles: u32,
}

impl CoffeeMaker {
    /// Validate `config` and build a switched-off coffee maker.
    pub fn new(config: BrewerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            session: None,
            cycles: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Wire the controllers to `hardware` and start polling.
    ///
    /// Order: build aggregator → register controllers → start aggregator
    /// → start poller. Subscriptions are complete before the first event
    /// can be published.
    pub fn switch_on<H>(&mut self, hardware: Arc<H>) -> Result<()>
    where
        H: HardwarePort + 'static,
    {
        if self.session.is_some() {
            warn!("CoffeeMaker: switch_on while already on");
            return Err(LifecycleError::AlreadyOn.into());
        }

        let aggregator = Arc::new(Aggregator::with_config(&self.config));
        Controllers::register_all(&aggregator, &hardware);
        aggregator.start()?;

        let poller = match Poller::spawn(Arc::clone(&aggregator), hardware, &self.config) {
            Ok(poller) => poller,
            Err(e) => {
                aggregator.stop();
                return Err(e);
            }
        };

        self.session = Some(Session { aggregator, poller });
        info!(
            "CoffeeMaker: switched on (cycle {}, polling every {} ms)",
            self.cycles + 1,
            self.config.poll_interval_ms
        );
        Ok(())
    }

    /// Stop polling, stop the aggregator, then give running handlers up
    /// to `shutdown_grace_ms` to finish. Handlers are never cancelled.
    ///
    /// Does nothing if the machine is already off.
    pub fn switch_off(&mut self) {
        let Some(mut session) = self.session.take() else {
            info!("CoffeeMaker: switch_off while off, nothing to do");
            return;
        };

        // Poller first: nothing may publish once the aggregator stops.
        session.poller.stop();
        session.aggregator.stop();

        let grace = self.config.shutdown_grace();
        if !session.aggregator.wait_idle(grace) {
            warn!(
                "CoffeeMaker: {} handler(s) still running after {:?}",
                session.aggregator.in_flight(),
                grace
            );
        }

        self.cycles += 1;
        info!(
            "CoffeeMaker: switched off ({} events dispatched this cycle)",
            session.aggregator.dispatched()
        );
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_on(&self) -> bool {
        self.session.is_some()
    }

    /// The current session's aggregator, if the machine is on.
    pub fn aggregator(&self) -> Option<&Arc<Aggregator>> {
        self.session.as_ref().map(|s| &s.aggregator)
    }

    /// Completed on → off cycles.
    pub fn power_cycles(&self) -> u32 {
        self.cycles
    }

    pub fn config(&self) -> &BrewerConfig {
        &self.config
    }
}

impl Drop for CoffeeMaker {
    fn drop(&mut self) {
        if self.is_on() {
            self.switch_off();
        }
    }
}
