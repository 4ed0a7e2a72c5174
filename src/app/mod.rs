//! Application core: port boundaries and the lifecycle façade.
//!
//! Hardware is reached only through the **port traits** in [`ports`];
//! [`service::CoffeeMaker`] wires the aggregator, controllers and poller
//! together behind `switch_on` / `switch_off`.

pub mod ports;
pub mod service;
