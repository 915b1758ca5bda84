//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! `channels`.

pub mod buttons;
pub mod can_rx;
pub mod control;
pub mod settings;

pub use buttons::buttons_task;
pub use can_rx::can_rx_task;
pub use control::{control_task, Valves};
pub use settings::settings_task;

use embassy_time::Instant;

/// Milliseconds since boot, wrapping
pub fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}
