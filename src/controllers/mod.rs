//! Component controllers: small reactive state machines.
//!
//! Each controller subscribes to the events it cares about and drives a
//! single actuator through the [`CommandPort`]:
//!
//! | Controller              | Subscribes to                          | Drives          |
//! |-------------------------|----------------------------------------|-----------------|
//! | `BoilerController`      | BoilerEmpty/NotEmpty, BrewButtonPushed | boiler heater   |
//! | `IndicatorController`   | BoilerEmpty/NotEmpty, BrewButtonPushed | indicator light |
//! | `ReliefValveController` | WarmerPlate*                           | relief valve    |
//! | `WarmerPlateController` | WarmerPlate*                           | warmer heater   |
//!
//! Controllers never share state: two of them may track the boiler level,
//! but each keeps its own copy, updated only by its own handlers. Handlers
//! for one controller can run on different threads at once, so mutable
//! state sits behind a `Mutex`.

pub mod boiler;
pub mod indicator;
pub mod relief_valve;
pub mod warmer_plate;

pub use boiler::BoilerController;
pub use indicator::IndicatorController;
pub use relief_valve::ReliefValveController;
pub use warmer_plate::WarmerPlateController;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::aggregator::Aggregator;
use crate::app::ports::CommandPort;

/// Lock a controller's state. A handler that panicked mid-update leaves
/// plain booleans behind, so the poison flag is ignored.
pub(crate) fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The four controllers of one switched-on session.
pub struct Controllers<C: CommandPort> {
    pub boiler: Arc<BoilerController<C>>,
    pub indicator: Arc<IndicatorController<C>>,
    pub relief_valve: Arc<ReliefValveController<C>>,
    pub warmer_plate: Arc<WarmerPlateController<C>>,
}

impl<C: CommandPort + 'static> Controllers<C> {
    /// Build every controller and register it with `aggregator`.
    pub fn register_all(aggregator: &Aggregator, commands: &Arc<C>) -> Self {
        let controllers = Self {
            boiler: BoilerController::register(aggregator, Arc::clone(commands)),
            indicator: IndicatorController::register(aggregator, Arc::clone(commands)),
            relief_valve: ReliefValveController::register(aggregator, Arc::clone(commands)),
            warmer_plate: WarmerPlateController::register(aggregator, Arc::clone(commands)),
        };
        log::info!("Controllers: boiler, indicator, relief valve, warmer plate registered");
        controllers
    }
}
