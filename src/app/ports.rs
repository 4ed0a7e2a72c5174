//! Port traits: the hexagonal boundary between control logic and the appliance.
//!
//! ```text
//!   Sensors ──▶ QueryPort ──▶ Poller ──▶ Aggregator ──▶ Controllers ──▶ CommandPort ──▶ Actuators
//! ```
//!
//! Driven adapters (real hardware, [`SimulatedHardware`](crate::adapters::sim::SimulatedHardware))
//! implement these traits. Both ports are shared across the poller,
//! dispatch and handler threads, so every method takes `&self` and the
//! traits require `Send + Sync`.

// ───────────────────────────────────────────────────────────────
// Sensor readings
// ───────────────────────────────────────────────────────────────

/// Boiler float switch: is there more than half a cup of water?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoilerStatus {
    Empty,
    NotEmpty,
}

/// Momentary brew button, latched since the previous read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrewButtonStatus {
    Pushed,
    NotPushed,
}

/// Warmer-plate sensor: pot presence and whether it holds coffee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarmerPlateStatus {
    /// No pot on the plate.
    WarmerEmpty,
    PotEmpty,
    PotNotEmpty,
}

// ───────────────────────────────────────────────────────────────
// Actuator states
// ───────────────────────────────────────────────────────────────

/// Boiler heating element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoilerState {
    On,
    Off,
}

/// "Coffee ready" indicator light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorState {
    On,
    Off,
}

/// Pressure-relief valve. Open vents steam so no water sprays over the
/// filter; closed lets boiler pressure push water through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReliefValveState {
    Open,
    Closed,
}

/// Warmer-plate heating element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarmerPlateState {
    On,
    Off,
}

// ───────────────────────────────────────────────────────────────
// Query port (driven adapter: hardware → core)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the poller calls this to sample the sensors.
///
/// Every call returns a value from the declared enumeration; the core
/// treats whatever comes back as authoritative.
pub trait QueryPort: Send + Sync {
    /// Current boiler water level.
    fn boiler_status(&self) -> BoilerStatus;

    /// Destructive read of the brew button latch.
    ///
    /// Returns the state remembered since the last call and resets it to
    /// [`BrewButtonStatus::NotPushed`], so a press is never missed even
    /// under slow polling.
    fn brew_button_status(&self) -> BrewButtonStatus;

    /// Current warmer-plate / pot state.
    fn warmer_plate_status(&self) -> WarmerPlateStatus;
}

// ───────────────────────────────────────────────────────────────
// Command port (driven adapter: core → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: controllers call this to drive actuators.
///
/// All commands are fire-and-forget; controllers never check the outcome.
pub trait CommandPort: Send + Sync {
    fn set_boiler_state(&self, state: BoilerState);

    fn set_indicator_state(&self, state: IndicatorState);

    fn set_relief_valve_state(&self, state: ReliefValveState);

    fn set_warmer_plate_state(&self, state: WarmerPlateState);
}

// ───────────────────────────────────────────────────────────────
// Combined port
// ───────────────────────────────────────────────────────────────

/// The full appliance boundary handed to
/// [`CoffeeMaker::switch_on`](super::service::CoffeeMaker::switch_on).
pub trait HardwarePort: QueryPort + CommandPort {}

impl<T: QueryPort + CommandPort> HardwarePort for T {}
