//! Front panel buttons
//!
//! Buttons are sampled on a fixed cadence and debounced here. Clicks and
//! holds go to a small queue for the UI; the up/down buttons also drive the
//! manual jog statuses directly.

pub mod debounce;
pub mod queue;

pub use debounce::{ButtonPanel, DEBOUNCE_MS, HOLD_MS};
pub use queue::{ButtonEvent, ClickQueue, PressKind, QUEUE_DEPTH};
