//! Board-agnostic core logic for the valve actuator firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Status/error bus shared between tasks
//! - Hardware abstraction traits (valves, CAN transmit, backup register)
//! - Sensor-link protocol engine and per-channel sensor state
//! - Actuator controller (state machine, PID and band policies)
//! - Button debouncing and click queue
//! - Boot gates and fatal-fault escalation
//! - Settings types, validation and persistence codec

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod log;

pub mod app;
pub mod config;
pub mod control;
pub mod input;
pub mod link;
pub mod safety;
pub mod status;
pub mod timer;
pub mod traits;
