//! Pressure-relief valve controller.
//!
//! Stateless: the valve opens when the pot leaves the warmer plate so
//! the boiler vents instead of spraying onto an empty plate, and closes
//! whenever a pot is present.

use std::sync::Arc;

use log::{debug, info};

use crate::aggregator::{Aggregator, Subscriber};
use crate::app::ports::{CommandPort, ReliefValveState};
use crate::events::Event;

/// Events this controller reacts to.
pub const SUBSCRIPTIONS: [Event; 3] = [
    Event::WarmerPlateEmpty,
    Event::WarmerPlatePotEmpty,
    Event::WarmerPlatePotNotEmpty,
];

/// Valve position for a warmer-plate event, `None` for anything else.
pub fn valve_state_for(event: Event) -> Option<ReliefValveState> {
    match event {
        Event::WarmerPlateEmpty => Some(ReliefValveState::Open),
        Event::WarmerPlatePotEmpty | Event::WarmerPlatePotNotEmpty => {
            Some(ReliefValveState::Closed)
        }
        _ => None,
    }
}

pub struct ReliefValveController<C: CommandPort> {
    commands: Arc<C>,
}

impl<C: CommandPort + 'static> ReliefValveController<C> {
    pub fn new(commands: Arc<C>) -> Self {
        Self { commands }
    }

    /// Build the controller and subscribe it to its events.
    pub fn register(aggregator: &Aggregator, commands: Arc<C>) -> Arc<Self> {
        let controller = Arc::new(Self::new(commands));
        aggregator.subscribe(controller.clone(), &SUBSCRIPTIONS);
        controller
    }
}

impl<C: CommandPort> Subscriber for ReliefValveController<C> {
    fn handle_event(&self, event: Event) {
        match valve_state_for(event) {
            Some(state) => {
                info!("ReliefValve: {} -> {:?}", event, state);
                self.commands.set_relief_valve_state(state);
            }
            None => debug!("ReliefValve: ignoring {}", event),
        }
    }
}
