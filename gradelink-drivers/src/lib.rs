//! Hardware driver implementations
//!
//! Concrete implementations of the gradelink-core traits over
//! embedded-hal GPIO:
//!
//! - Valve pair (raise/lower solenoids)
//! - Front panel buttons

#![no_std]
#![deny(unsafe_code)]

pub mod buttons;
pub mod valve;

pub use buttons::GpioButtons;
pub use valve::GpioValvePair;
