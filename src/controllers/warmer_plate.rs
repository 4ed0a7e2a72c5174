//! Warmer-plate heater controller.
//!
//! Stateless: the plate heats only while a pot with coffee sits on it.

use std::sync::Arc;

use log::{debug, info};

use crate::aggregator::{Aggregator, Subscriber};
use crate::app::ports::{CommandPort, WarmerPlateState};
use crate::events::Event;

/// Events this controller reacts to.
pub const SUBSCRIPTIONS: [Event; 3] = [
    Event::WarmerPlateEmpty,
    Event::WarmerPlatePotEmpty,
    Event::WarmerPlatePotNotEmpty,
];

/// Heater state for a warmer-plate event, `None` for anything else.
pub fn heater_state_for(event: Event) -> Option<WarmerPlateState> {
    match event {
        Event::WarmerPlatePotNotEmpty => Some(WarmerPlateState::On),
        Event::WarmerPlateEmpty | Event::WarmerPlatePotEmpty => Some(WarmerPlateState::Off),
        _ => None,
    }
}

pub struct WarmerPlateController<C: CommandPort> {
    commands: Arc<C>,
}

impl<C: CommandPort + 'static> WarmerPlateController<C> {
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

impl<C: CommandPort> Subscriber for WarmerPlateController<C> {
    fn handle_event(&self, event: Event) {
        match heater_state_for(event) {
            Some(state) => {
                info!("WarmerPlate: {} -> heater {:?}", event, state);
                self.commands.set_warmer_plate_state(state);
            }
            None => debug!("WarmerPlate: ignoring {}", event),
        }
    }
}
