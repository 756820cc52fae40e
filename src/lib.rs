#![cfg_attr(not(test), no_std)]
//! Event-and-state core of a Eurorack gate/trigger processor.
//!
//! This crate is the hardware-independent half of the firmware: debounced
//! button input, CV hysteresis, a generic table-driven FSM, the gesture
//! vocabulary that turns button/CV edges into semantic events, the five
//! output mode handlers, LED feedback, and settings persistence. A board
//! bring-up crate supplies a concrete [`hal::Hal`] implementation and drives
//! [`startup::startup`] followed by a `Coordinator::update` call once per
//! tick.

pub mod button;
pub mod coordinator;
pub mod cv;
pub mod event;
pub mod fsm;
pub mod hal;
pub mod led;
pub mod modes;
pub mod settings;
pub mod startup;

#[cfg(feature = "diagnostics")]
pub mod diagnostics;

#[cfg(any(test, feature = "std"))]
pub mod testing;

pub use coordinator::Coordinator;
pub use hal::Hal;
pub use startup::{startup, StartupResult};
