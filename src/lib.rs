//! Brewctl: event-driven control core for a drip coffee maker.
//!
//! A poller samples the sensors through a [`app::ports::QueryPort`],
//! turns each reading into an [`events::Event`] and publishes it to the
//! [`aggregator::Aggregator`], which fans it out to the component
//! controllers. Controllers drive the actuators through a
//! [`app::ports::CommandPort`]. [`app::service::CoffeeMaker`] switches
//! the whole pipeline on and off.
//!
//! The library installs no logger; binaries and tests pick their own
//! `log` backend.

#![deny(unused_must_use)]

pub mod adapters;
pub mod aggregator;
pub mod app;
pub mod config;
pub mod controllers;
pub mod error;
pub mod events;
pub mod poller;
pub mod task;

pub use error::{Error, Result};

// Links the std critical-section implementation used by embassy-sync.
use critical_section as _;
