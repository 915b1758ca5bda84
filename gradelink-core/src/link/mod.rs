//! Sensor link
//!
//! [`SensorBank`] holds what the CAN receive path learns from the sensor
//! unit; [`SensorLink`] drives the request side of the protocol.

pub mod channel;
pub mod engine;

pub use channel::{SensorBank, SensorChannel, SILENCE_WINDOW_MS};
pub use engine::{AbortReason, LinkState, SensorLink};
