//! Indicator light controller.
//!
//! The light says "coffee ready". It goes off when a brew starts and
//! comes on when the boiler runs dry during a brew, which is how the
//! brew cycle ends.

use std::sync::{Arc, Mutex};

use log::{debug, info};

use super::lock;
use crate::aggregator::{Aggregator, Subscriber};
use crate::app::ports::{CommandPort, IndicatorState};
use crate::events::Event;

/// Events this controller reacts to.
pub const SUBSCRIPTIONS: [Event; 3] = [
    Event::BoilerEmpty,
    Event::BoilerNotEmpty,
    Event::BrewButtonPushed,
];

#[derive(Debug, Default, Clone, Copy)]
struct IndicatorView {
    boiler_empty: bool,
    brewing_in_progress: bool,
}

pub struct IndicatorController<C: CommandPort> {
    commands: Arc<C>,
    view: Mutex<IndicatorView>,
}

impl<C: CommandPort + 'static> IndicatorController<C> {
    pub fn new(commands: Arc<C>) -> Self {
        Self {
            commands,
            view: Mutex::new(IndicatorView::default()),
        }
    }

    /// Build the controller and subscribe it to its events.
    pub fn register(aggregator: &Aggregator, commands: Arc<C>) -> Arc<Self> {
        let controller = Arc::new(Self::new(commands));
        aggregator.subscribe(controller.clone(), &SUBSCRIPTIONS);
        controller
    }
}

impl<C: CommandPort> IndicatorController<C> {
    /// This controller's own view of the boiler level.
    pub fn boiler_empty(&self) -> bool {
        lock(&self.view).boiler_empty
    }

    pub fn brewing_in_progress(&self) -> bool {
        lock(&self.view).brewing_in_progress
    }

    fn on_boiler_empty(&self) {
        let mut view = lock(&self.view);
        view.boiler_empty = true;
        if view.brewing_in_progress {
            view.brewing_in_progress = false;
            info!("Indicator: boiler ran dry, brew complete -> light ON");
            self.commands.set_indicator_state(IndicatorState::On);
        }
    }

    fn on_boiler_not_empty(&self) {
        lock(&self.view).boiler_empty = false;
    }

    fn on_brew_button(&self) {
        let mut view = lock(&self.view);
        if !view.boiler_empty {
            view.brewing_in_progress = true;
            info!("Indicator: brew started -> light OFF");
            self.commands.set_indicator_state(IndicatorState::Off);
        }
    }
}

impl<C: CommandPort> Subscriber for IndicatorController<C> {
    fn handle_event(&self, event: Event) {
        match event {
            Event::BoilerEmpty => self.on_boiler_empty(),
            Event::BoilerNotEmpty => self.on_boiler_not_empty(),
            Event::BrewButtonPushed => self.on_brew_button(),
            other => debug!("Indicator: ignoring {}", other),
        }
    }
}
