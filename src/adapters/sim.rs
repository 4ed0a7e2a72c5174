//! Simulated appliance: an in-memory implementation of both ports.
//!
//! Sensor values are held in atomics and set by the test or demo driving
//! the simulation. Every actuator command is appended to a log and also
//! folded into the current actuator state, so callers can assert on
//! either the full history or the final position.
//!
//! Defaults are a safe idle appliance: boiler full, button untouched,
//! no pot, every actuator off and the valve closed.

use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::app::ports::{
    BoilerState, BoilerStatus, BrewButtonStatus, CommandPort, IndicatorState, QueryPort,
    ReliefValveState, WarmerPlateState, WarmerPlateStatus,
};

/// One recorded actuator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorCommand {
    Boiler(BoilerState),
    Indicator(IndicatorState),
    ReliefValve(ReliefValveState),
    WarmerPlate(WarmerPlateState),
}

/// Latest commanded position of every actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorSnapshot {
    pub boiler: BoilerState,
    pub indicator: IndicatorState,
    pub relief_valve: ReliefValveState,
    pub warmer_plate: WarmerPlateState,
}

impl Default for ActuatorSnapshot {
    fn default() -> Self {
        Self {
            boiler: BoilerState::Off,
            indicator: IndicatorState::Off,
            relief_valve: ReliefValveState::Closed,
            warmer_plate: WarmerPlateState::Off,
        }
    }
}

#[derive(Debug, Default)]
struct ActuatorLog {
    history: Vec<ActuatorCommand>,
    current: ActuatorSnapshot,
}

pub struct SimulatedHardware {
    boiler_empty: AtomicBool,
    /// Brew button latch, cleared by every read.
    brew_latched: AtomicBool,
    warmer_plate: AtomicU8,
    actuators: Mutex<ActuatorLog>,
}

impl SimulatedHardware {
    pub fn new() -> Self {
        Self {
            boiler_empty: AtomicBool::new(false),
            brew_latched: AtomicBool::new(false),
            warmer_plate: AtomicU8::new(encode_plate(WarmerPlateStatus::WarmerEmpty)),
            actuators: Mutex::new(ActuatorLog::default()),
        }
    }

    // ── Sensor side ───────────────────────────────────────────

    pub fn set_boiler_status(&self, status: BoilerStatus) {
        self.boiler_empty
            .store(status == BoilerStatus::Empty, Ordering::Release);
    }

    /// Latch a brew button press until the next read.
    pub fn press_brew_button(&self) {
        self.brew_latched.store(true, Ordering::Release);
    }

    pub fn set_warmer_plate_status(&self, status: WarmerPlateStatus) {
        self.warmer_plate
            .store(encode_plate(status), Ordering::Release);
    }

    // ── Actuator side ─────────────────────────────────────────

    /// Every command received so far, oldest first.
    pub fn commands(&self) -> Vec<ActuatorCommand> {
        self.log().history.clone()
    }

    /// Latest commanded position of every actuator.
    pub fn actuators(&self) -> ActuatorSnapshot {
        self.log().current
    }

    /// Forget recorded commands; actuator positions are kept.
    pub fn clear_commands(&self) {
        self.log().history.clear();
    }

    fn log(&self) -> std::sync::MutexGuard<'_, ActuatorLog> {
        self.actuators.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, command: ActuatorCommand) {
        let mut log = self.log();
        match command {
            ActuatorCommand::Boiler(s) => log.current.boiler = s,
            ActuatorCommand::Indicator(s) => log.current.indicator = s,
            ActuatorCommand::ReliefValve(s) => log.current.relief_valve = s,
            ActuatorCommand::WarmerPlate(s) => log.current.warmer_plate = s,
        }
        log.history.push(command);
    }
}

impl Default for SimulatedHardware {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_plate(status: WarmerPlateStatus) -> u8 {
    match status {
        WarmerPlateStatus::WarmerEmpty => 0,
        WarmerPlateStatus::PotEmpty => 1,
        WarmerPlateStatus::PotNotEmpty => 2,
    }
}

fn decode_plate(raw: u8) -> WarmerPlateStatus {
    match raw {
        0 => WarmerPlateStatus::WarmerEmpty,
        1 => WarmerPlateStatus::PotEmpty,
        _ => WarmerPlateStatus::PotNotEmpty,
    }
}

// ── QueryPort implementation ──────────────────────────────────

impl QueryPort for SimulatedHardware {
    fn boiler_status(&self) -> BoilerStatus {
        if self.boiler_empty.load(Ordering::Acquire) {
            BoilerStatus::Empty
        } else {
            BoilerStatus::NotEmpty
        }
    }

    fn brew_button_status(&self) -> BrewButtonStatus {
        if self.brew_latched.swap(false, Ordering::AcqRel) {
            BrewButtonStatus::Pushed
        } else {
            BrewButtonStatus::NotPushed
        }
    }

    fn warmer_plate_status(&self) -> WarmerPlateStatus {
        decode_plate(self.warmer_plate.load(Ordering::Acquire))
    }
}

// ── CommandPort implementation ────────────────────────────────

impl CommandPort for SimulatedHardware {
    fn set_boiler_state(&self, state: BoilerState) {
        self.record(ActuatorCommand::Boiler(state));
    }

    fn set_indicator_state(&self, state: IndicatorState) {
        self.record(ActuatorCommand::Indicator(state));
    }

    fn set_relief_valve_state(&self, state: ReliefValveState) {
        self.record(ActuatorCommand::ReliefValve(state));
    }

    fn set_warmer_plate_state(&self, state: WarmerPlateState) {
        self.record(ActuatorCommand::WarmerPlate(state));
    }
}
