//! Boiler heater controller.
//!
//! | Event            | State update           | Command                      |
//! |------------------|------------------------|------------------------------|
//! | BoilerEmpty      | `boiler_empty = true`  | heater OFF                   |
//! | BoilerNotEmpty   | `boiler_empty = false` | none                         |
//! | BrewButtonPushed | none                   | heater ON, only if not empty |
//!
//! The heater is never switched on over an empty boiler.

use std::sync::{Arc, Mutex};

use log::{debug, info};

use super::lock;
use crate::aggregator::{Aggregator, Subscriber};
use crate::app::ports::{BoilerState, CommandPort};
use crate::events::Event;

/// Events this controller reacts to.
pub const SUBSCRIPTIONS: [Event; 3] = [
    Event::BoilerEmpty,
    Event::BoilerNotEmpty,
    Event::BrewButtonPushed,
];

pub struct BoilerController<C: CommandPort> {
    commands: Arc<C>,
    /// Latest known boiler level. Starts as not-empty.
    boiler_empty: Mutex<bool>,
}

impl<C: CommandPort + 'static> BoilerController<C> {
    pub fn new(commands: Arc<C>) -> Self {
        Self {
            commands,
            boiler_empty: Mutex::new(false),
        }
    }

    /// Build the controller and subscribe it to its events.
    pub fn register(aggregator: &Aggregator, commands: Arc<C>) -> Arc<Self> {
        let controller = Arc::new(Self::new(commands));
        aggregator.subscribe(controller.clone(), &SUBSCRIPTIONS);
        controller
    }
}

impl<C: CommandPort> BoilerController<C> {
    /// Whether the last boiler event reported an empty boiler.
    pub fn boiler_empty(&self) -> bool {
        *lock(&self.boiler_empty)
    }

    fn on_boiler_level(&self, empty: bool) {
        let mut boiler_empty = lock(&self.boiler_empty);
        *boiler_empty = empty;
        if empty {
            info!("Boiler: empty -> heater OFF");
            self.commands.set_boiler_state(BoilerState::Off);
        }
    }

    fn on_brew_button(&self) {
        let boiler_empty = lock(&self.boiler_empty);
        if *boiler_empty {
            info!("Boiler: brew requested with empty boiler, ignoring");
        } else {
            info!("Boiler: brew requested -> heater ON");
            self.commands.set_boiler_state(BoilerState::On);
        }
    }
}

impl<C: CommandPort> Subscriber for BoilerController<C> {
    fn handle_event(&self, event: Event) {
        match event {
            Event::BoilerEmpty => self.on_boiler_level(true),
            Event::BoilerNotEmpty => self.on_boiler_level(false),
            Event::BrewButtonPushed => self.on_brew_button(),
            other => debug!("Boiler: ignoring {}", other),
        }
    }
}
