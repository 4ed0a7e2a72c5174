//! Brewer domain events.
//!
//! Events are produced by the [`Poller`](crate::poller::Poller), which
//! samples the sensors, and consumed by the controllers through the
//! [`Aggregator`](crate::aggregator::Aggregator).
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │ Boiler      │────▶│              │────▶│ BoilerController │
//! │ Brew button │────▶│  Aggregator  │────▶│ Indicator...     │
//! │ Warmer plate│────▶│  (dispatch)  │────▶│ ReliefValve...   │
//! │  (Poller)   │     │              │────▶│ WarmerPlate...   │
//! └─────────────┘     └──────────────┘     └──────────────────┘
//! ```
//!
//! The set is closed: every event the system can see is a variant here,
//! so handlers never have to recover a concrete type at runtime.

use core::fmt;

/// Discrete appliance conditions observed by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Event {
    // ── Boiler ────────────────────────────────────────────
    /// Water level in the boiler is below the float switch.
    BoilerEmpty = 0,
    /// The boiler holds enough water to brew.
    BoilerNotEmpty = 1,

    // ── Warmer plate ──────────────────────────────────────
    /// No pot on the warmer plate.
    WarmerPlateEmpty = 2,
    /// Pot present, no coffee in it.
    WarmerPlatePotEmpty = 3,
    /// Pot present and holding coffee.
    WarmerPlatePotNotEmpty = 4,

    // ── Brew button ───────────────────────────────────────
    /// Brew button was not pressed since the last read.
    BrewButtonNotPushed = 5,
    /// Brew button was pressed since the last read.
    BrewButtonPushed = 6,
}

impl Event {
    /// Total number of events, used to size per-event tables.
    pub const COUNT: usize = 7;

    /// Every event, in discriminant order.
    pub const ALL: [Event; Event::COUNT] = [
        Event::BoilerEmpty,
        Event::BoilerNotEmpty,
        Event::WarmerPlateEmpty,
        Event::WarmerPlatePotEmpty,
        Event::WarmerPlatePotNotEmpty,
        Event::BrewButtonNotPushed,
        Event::BrewButtonPushed,
    ];

    /// Stable table index for this event.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Convert a table index back to an event.
    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::BoilerEmpty => "BoilerEmpty",
            Self::BoilerNotEmpty => "BoilerNotEmpty",
            Self::WarmerPlateEmpty => "WarmerPlateEmpty",
            Self::WarmerPlatePotEmpty => "WarmerPlatePotEmpty",
            Self::WarmerPlatePotNotEmpty => "WarmerPlatePotNotEmpty",
            Self::BrewButtonNotPushed => "BrewButtonNotPushed",
            Self::BrewButtonPushed => "BrewButtonPushed",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
