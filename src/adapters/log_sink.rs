//! Logging command adapter.
//!
//! Wraps any [`CommandPort`] and writes each actuator command to the log
//! before forwarding it. Useful for bench runs against real hardware or
//! the simulator.

use log::info;

use crate::app::ports::{
    BoilerState, CommandPort, IndicatorState, ReliefValveState, WarmerPlateState,
};

/// Decorator that logs every command passed to the inner port.
pub struct LoggingCommandPort<P> {
    inner: P,
}

impl<P: CommandPort> LoggingCommandPort<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: CommandPort> CommandPort for LoggingCommandPort<P> {
    fn set_boiler_state(&self, state: BoilerState) {
        info!("CMD | boiler heater {:?}", state);
        self.inner.set_boiler_state(state);
    }

    fn set_indicator_state(&self, state: IndicatorState) {
        info!("CMD | indicator {:?}", state);
        self.inner.set_indicator_state(state);
    }

    fn set_relief_valve_state(&self, state: ReliefValveState) {
        info!("CMD | relief valve {:?}", state);
        self.inner.set_relief_valve_state(state);
    }

    fn set_warmer_plate_state(&self, state: WarmerPlateState) {
        info!("CMD | warmer plate {:?}", state);
        self.inner.set_warmer_plate_state(state);
    }
}
