//! Event aggregator: the publish/subscribe dispatch engine.
//!
//! ```text
//!  Poller ──publish──▶ [ slot ] ──▶ dispatch loop ──┬──▶ handler thread (sub 1)
//!     ▲                                  │          ├──▶ handler thread (sub 2)
//!     └──────────── accepted ◀───────────┘          └──▶ ...
//! ```
//!
//! `publish` is a rendezvous. The event goes into a single-slot channel
//! and the publisher waits on a second single-slot channel until the
//! dispatch loop has taken the event and spawned its fan-out. A slow
//! dispatch therefore delays the next poll cycle instead of queueing.
//!
//! ## Ordering
//!
//! - Events reach the dispatch loop in publish order, one at a time.
//! - Fan-out for event N is spawned before event N+1 is accepted. Each
//!   fan-out gets the next [`dispatch_sequence`] number.
//! - Handlers run on their own threads: handlers of the same event are
//!   unordered with respect to each other, and a handler for N+1 may
//!   finish before a handler for N.
//!
//! ## Lifecycle
//!
//! `Created ──start──▶ Running ──stop──▶ Stopped` (terminal). Publishing
//! after stop is a wiring bug and panics. A publish caught by a
//! concurrent stop either completes, because its fan-out was already
//! under way, or fails with [`LifecycleError::Stopped`]. An accepted
//! event is never dropped. Stop does not cancel handlers that are
//! already running.

mod subscriber;

pub use subscriber::{Subscriber, SubscriberFn};

use std::cell::Cell;
use std::sync::atomic::{AtomicU8, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use async_io_mini::Timer;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex as AsyncMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::{debug, error, info, trace, warn};

use crate::config::BrewerConfig;
use crate::error::{Error, LifecycleError, Result};
use crate::events::Event;
use crate::task;

// ---------------------------------------------------------------------------
// Lifecycle state
// ---------------------------------------------------------------------------

/// Aggregator lifecycle. Stored in an `AtomicU8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Created = 0,
    Running = 1,
    Stopped = 2,
}

impl LifecycleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Created,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch sequence
// ---------------------------------------------------------------------------

thread_local! {
    static DISPATCH_SEQ: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Sequence number of the dispatch the calling handler thread serves.
///
/// Numbers start at 1 per aggregator and follow the order in which the
/// dispatch loop began each fan-out. `None` outside a handler thread.
pub fn dispatch_sequence() -> Option<u64> {
    DISPATCH_SEQ.with(Cell::get)
}

// ---------------------------------------------------------------------------
// In-flight handler accounting
// ---------------------------------------------------------------------------

/// Running handler count plus a signal raised each time it drops to zero.
struct HandlerCount {
    running: AtomicUsize,
    idle: Signal<CriticalSectionRawMutex, ()>,
}

/// Counts one running handler; the count drops when the guard does,
/// including when the handler panics or its thread fails to spawn.
struct InFlight(Arc<HandlerCount>);

impl InFlight {
    fn enter(count: &Arc<HandlerCount>) -> Self {
        count.running.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(count))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.0.running.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.signal(());
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

type SubscriberList = Vec<Arc<dyn Subscriber>>;

/// Publish/subscribe engine connecting the poller to the controllers.
pub struct Aggregator {
    state: AtomicU8,
    /// One ordered subscriber list per event, indexed by `Event::index()`.
    subscribers: RwLock<[SubscriberList; Event::COUNT]>,
    /// Publisher → dispatch loop hand-off slot.
    queue: Channel<CriticalSectionRawMutex, Event, 1>,
    /// Dispatch loop → publisher acceptance notice.
    accepted: Channel<CriticalSectionRawMutex, (), 1>,
    /// Serialises publishers so each one waits for its own acceptance.
    publish_lock: AsyncMutex<CriticalSectionRawMutex, ()>,
    /// Wakes the dispatch loop on stop.
    shutdown: Signal<CriticalSectionRawMutex, ()>,
    /// Wakes the publisher holding the turn on stop.
    closed: Signal<CriticalSectionRawMutex, ()>,
    dispatch_thread: Mutex<Option<JoinHandle<()>>>,
    handlers: Arc<HandlerCount>,
    dispatched: AtomicU64,
    dispatch_stack_kb: usize,
    handler_stack_kb: usize,
}

impl Aggregator {
    /// Construct an aggregator with default thread stacks.
    pub fn new() -> Self {
        Self::with_config(&BrewerConfig::default())
    }

    /// Construct an aggregator sized from `config`.
    pub fn with_config(config: &BrewerConfig) -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Created as u8),
            subscribers: RwLock::new(core::array::from_fn(|_| Vec::new())),
            queue: Channel::new(),
            accepted: Channel::new(),
            publish_lock: AsyncMutex::new(()),
            shutdown: Signal::new(),
            closed: Signal::new(),
            dispatch_thread: Mutex::new(None),
            handlers: Arc::new(HandlerCount {
                running: AtomicUsize::new(0),
                idle: Signal::new(),
            }),
            dispatched: AtomicU64::new(0),
            dispatch_stack_kb: config.dispatch_stack_kb,
            handler_stack_kb: config.handler_stack_kb,
        }
    }

    // ── Subscription ──────────────────────────────────────────

    /// Register `subscriber` for each of `events`, appended after any
    /// existing subscribers of that event.
    ///
    /// Registrations made after [`start`](Self::start) race with dispatch;
    /// complete them before starting for deterministic delivery.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>, events: &[Event]) {
        if self.state() != LifecycleState::Created {
            debug!("Aggregator: late subscription to {:?}", events);
        }
        let mut table = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for event in events {
            table[event.index()].push(Arc::clone(&subscriber));
            trace!("Aggregator: subscribed to {}", event);
        }
    }

    /// Register a closure as a subscriber for each of `events`.
    pub fn subscribe_fn<F>(&self, handler: F, events: &[Event])
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(SubscriberFn(handler)), events);
    }

    /// Number of subscribers registered for `event`.
    pub fn subscriber_count(&self, event: Event) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)[event.index()]
            .len()
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move `Created → Running` and spawn the dispatch loop.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        if let Err(raw) = self.state.compare_exchange(
            LifecycleState::Created as u8,
            LifecycleState::Running as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            let err = LifecycleError::on_start(LifecycleState::from_u8(raw));
            warn!("Aggregator: start refused ({})", err);
            return Err(err.into());
        }

        let me = Arc::clone(self);
        let handle = task::spawn_named("aggregator", self.dispatch_stack_kb, move || {
            me.run_dispatch_loop();
        })
        .map_err(|e| {
            error!("Aggregator: dispatch thread failed to spawn: {}", e);
            self.state
                .store(LifecycleState::Stopped as u8, Ordering::Release);
            self.closed.signal(());
            Error::Spawn("aggregator")
        })?;

        *self
            .dispatch_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
        info!("Aggregator: started");
        Ok(())
    }

    /// Move to `Stopped` and wait for the dispatch loop to exit.
    ///
    /// A publisher still waiting for acceptance is released with
    /// [`LifecycleError::Stopped`]. Idempotent. Handlers already spawned
    /// keep running; use [`wait_idle`](Self::wait_idle) to wait for them.
    pub fn stop(&self) {
        let prev = LifecycleState::from_u8(
            self.state
                .swap(LifecycleState::Stopped as u8, Ordering::AcqRel),
        );
        match prev {
            LifecycleState::Stopped => {
                debug!("Aggregator: already stopped");
                return;
            }
            LifecycleState::Created => {
                self.closed.signal(());
                info!("Aggregator: stopped before start");
                return;
            }
            LifecycleState::Running => {}
        }

        self.shutdown.signal(());
        self.closed.signal(());
        let handle = self
            .dispatch_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Aggregator: dispatch thread panicked");
            }
        }
        info!(
            "Aggregator: stopped ({} events dispatched, {} handlers in flight)",
            self.dispatched(),
            self.in_flight()
        );
    }

    // ── Publishing ────────────────────────────────────────────

    /// Hand `event` to the dispatch loop, blocking until it is accepted.
    ///
    /// Blocks while the aggregator has not been started, until it is
    /// started or stopped.
    ///
    /// # Panics
    ///
    /// Panics when the aggregator is stopped, before or during the call;
    /// that is a lifecycle bug in the caller, not a recoverable condition.
    pub fn publish(&self, event: Event) {
        if let Err(e) = self.try_publish(event) {
            panic!("cannot publish {event}: {e}");
        }
    }

    /// Like [`publish`](Self::publish) but reports a stopped aggregator
    /// as [`LifecycleError::Stopped`] instead of panicking.
    ///
    /// `Ok` means the event was accepted and its fan-out spawned; `Err`
    /// means it was not dispatched at all.
    pub fn try_publish(&self, event: Event) -> Result<()> {
        if self.state() == LifecycleState::Stopped {
            error!("Aggregator: publish of {} after stop", event);
            return Err(LifecycleError::Stopped.into());
        }

        let accepted = future::block_on(async {
            let _turn = self.publish_lock.lock().await;
            // Stop may have landed while waiting for the turn.
            if self.state() == LifecycleState::Stopped {
                return false;
            }

            self.queue.send(event).await;
            let acked = future::or(
                async {
                    self.accepted.receive().await;
                    true
                },
                async {
                    self.closed.wait().await;
                    false
                },
            )
            .await;
            if acked {
                return true;
            }

            // Stopped while waiting. An event still in the slot was never
            // taken; otherwise its fan-out is under way and the ack follows.
            if self.queue.try_receive().is_ok() {
                false
            } else {
                self.accepted.receive().await;
                true
            }
        });

        if accepted {
            Ok(())
        } else {
            error!("Aggregator: publish of {} refused, stopped meanwhile", event);
            Err(LifecycleError::Stopped.into())
        }
    }

    // ── Supervision ───────────────────────────────────────────

    /// Total events accepted by the dispatch loop.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Acquire)
    }

    /// Handlers currently running.
    pub fn in_flight(&self) -> usize {
        self.handlers.running.load(Ordering::Acquire)
    }

    /// Wait until no handler is running. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight() != 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            // A stale idle signal only causes one extra pass of the loop.
            future::block_on(future::or(self.handlers.idle.wait(), async {
                Timer::after(remaining).await;
            }));
        }
        true
    }

    // ── Internal ──────────────────────────────────────────────

    /// Sole consumer of the hand-off slot. Exits on the shutdown signal.
    fn run_dispatch_loop(&self) {
        debug!("Aggregator: dispatch loop running");
        future::block_on(async {
            loop {
                // Shutdown is polled first so stop wins over a pending event.
                let next = future::or(
                    async {
                        self.shutdown.wait().await;
                        None
                    },
                    async { Some(self.queue.receive().await) },
                )
                .await;

                let Some(event) = next else {
                    break;
                };

                self.fan_out(event);
                self.accepted.send(()).await;
            }
        });
        debug!("Aggregator: dispatch loop exited");
    }

    /// Spawn one handler thread per subscriber of `event`.
    /// Returns the number of handlers spawned.
    fn fan_out(&self, event: Event) -> usize {
        let seq = self.dispatched.fetch_add(1, Ordering::AcqRel) + 1;

        let targets: SubscriberList = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)[event.index()]
            .clone();

        if targets.is_empty() {
            trace!("Aggregator: #{} {} has no subscribers", seq, event);
            return 0;
        }
        debug!("Aggregator: #{} {} -> {} subscriber(s)", seq, event, targets.len());

        let mut spawned = 0;
        for subscriber in targets {
            let guard = InFlight::enter(&self.handlers);
            let result = task::spawn_named(
                format!("on-{}", event.name()),
                self.handler_stack_kb,
                move || {
                    let _guard = guard;
                    DISPATCH_SEQ.with(|s| s.set(Some(seq)));
                    subscriber.handle_event(event);
                },
            );
            match result {
                Ok(_) => spawned += 1,
                Err(e) => error!("Aggregator: handler for {} failed to spawn: {}", event, e),
            }
        }
        spawned
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}
