//! Sensor poller.
//!
//! Samples the [`QueryPort`] on a fixed period, turns each reading into
//! exactly one [`Event`] and publishes the three events in a fixed order:
//! boiler, brew button, warmer plate.
//!
//! ```text
//!            every poll_interval_ms
//!  QueryPort ──────────────────────▶ [BoilerX, BrewButtonX, WarmerPlateX] ──publish──▶ Aggregator
//! ```
//!
//! Publishing is a rendezvous, so a slow dispatch stretches the cycle
//! rather than piling events up.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use async_io_mini::Timer;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::{debug, error, info, trace};

use crate::aggregator::Aggregator;
use crate::app::ports::{BoilerStatus, BrewButtonStatus, QueryPort, WarmerPlateStatus};
use crate::config::BrewerConfig;
use crate::error::{Error, Result};
use crate::events::Event;
use crate::task;

// ── Sensor → event mapping ────────────────────────────────────

impl From<BoilerStatus> for Event {
    fn from(status: BoilerStatus) -> Self {
        match status {
            BoilerStatus::Empty => Event::BoilerEmpty,
            BoilerStatus::NotEmpty => Event::BoilerNotEmpty,
        }
    }
}

impl From<BrewButtonStatus> for Event {
    fn from(status: BrewButtonStatus) -> Self {
        match status {
            BrewButtonStatus::Pushed => Event::BrewButtonPushed,
            BrewButtonStatus::NotPushed => Event::BrewButtonNotPushed,
        }
    }
}

impl From<WarmerPlateStatus> for Event {
    fn from(status: WarmerPlateStatus) -> Self {
        match status {
            WarmerPlateStatus::WarmerEmpty => Event::WarmerPlateEmpty,
            WarmerPlateStatus::PotEmpty => Event::WarmerPlatePotEmpty,
            WarmerPlateStatus::PotNotEmpty => Event::WarmerPlatePotNotEmpty,
        }
    }
}

/// Read every sensor once, in publish order.
///
/// Consumes the brew-button latch.
pub fn sample<Q: QueryPort + ?Sized>(sensors: &Q) -> [Event; 3] {
    [
        sensors.boiler_status().into(),
        sensors.brew_button_status().into(),
        sensors.warmer_plate_status().into(),
    ]
}

/// Run one poll cycle: sample, then publish each event in order.
pub fn poll_once<Q: QueryPort + ?Sized>(aggregator: &Aggregator, sensors: &Q) -> [Event; 3] {
    let events = sample(sensors);
    trace!("Poller: {} | {} | {}", events[0], events[1], events[2]);
    for event in events {
        aggregator.publish(event);
    }
    events
}

// ── Poller thread ─────────────────────────────────────────────

/// Handle to the periodic sampling thread.
pub struct Poller {
    stop: Arc<Signal<CriticalSectionRawMutex, ()>>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Start sampling `sensors` every `config.poll_interval_ms`.
    ///
    /// The first cycle runs one full period after this call.
    pub fn spawn<Q>(aggregator: Arc<Aggregator>, sensors: Arc<Q>, config: &BrewerConfig) -> Result<Self>
    where
        Q: QueryPort + 'static,
    {
        let interval = config.poll_interval();
        let stop = Arc::new(Signal::<CriticalSectionRawMutex, ()>::new());
        let stop_rx = Arc::clone(&stop);

        let handle = task::spawn_named("poller", config.poller_stack_kb, move || {
            info!("Poller: sampling every {:?}", interval);
            let mut cycles: u64 = 0;
            let mut next_tick = Instant::now() + interval;
            loop {
                let wait = next_tick.saturating_duration_since(Instant::now());
                let stopped = future::block_on(future::or(
                    async {
                        stop_rx.wait().await;
                        true
                    },
                    async {
                        Timer::after(wait).await;
                        false
                    },
                ));
                if stopped {
                    break;
                }

                poll_once(&aggregator, &*sensors);
                cycles += 1;

                next_tick += interval;
                let now = Instant::now();
                if next_tick <= now {
                    debug!("Poller: cycle {} overran its period, resyncing", cycles);
                    next_tick = now + interval;
                }
            }
            info!("Poller: stopped after {} cycles", cycles);
        })
        .map_err(|e| {
            error!("Poller: thread failed to spawn: {}", e);
            Error::Spawn("poller")
        })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Whether the sampling thread is still owned by this handle.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop sampling and wait for the thread to finish its current cycle.
    ///
    /// Idempotent.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop.signal(());
        if handle.join().is_err() {
            error!("Poller: thread panicked");
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
