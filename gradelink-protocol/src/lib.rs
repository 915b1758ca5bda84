//! Sensor-link CAN protocol
//!
//! This crate defines the frames exchanged between the valve controller and
//! the remote distance sensor unit on the shared CAN bus. The sensor unit
//! speaks a strict request/response protocol for configuration and streams
//! unsolicited distance reports.
//!
//! # Protocol Overview
//!
//! All traffic uses standard (11-bit) identifiers and at most 8 data bytes:
//! ```text
//! ┌──────────┬──────────────────────────┐
//! │ ID 11b   │ DATA 0–8B                │
//! └──────────┴──────────────────────────┘
//!
//! 0x0050 / 0x0028   bring-up sequence          controller → sensor
//! 0x07EC            handshake request          controller → sensor
//! 0x07ED            handshake ack              sensor → controller
//! 0x0028 + 0x03F0   periodic feedback pair     controller → sensor
//! 0x02A7/8/B        distance report            sensor → controller
//! ```
//!
//! Multi-byte values are big-endian two's complement.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod direction;
pub mod frame;
pub mod messages;
pub mod mode;

pub use direction::Direction;
pub use frame::{decode_i16, encode_i16, CanFrame, FrameError, MAX_DATA_LEN};
pub use messages::{DistanceReport, LinkRequest, StaticFrame, BRING_UP_SEQUENCE};
pub use mode::{SensorMode, SensorNode};
