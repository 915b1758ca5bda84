//! Control task
//!
//! Runs the link engine and the actuator controller on a fixed tick,
//! applies queued button events, and hands changed settings to the
//! persistence task.

use defmt::*;
use embassy_stm32::gpio::Output;
use embassy_time::{Duration, Ticker};

use gradelink_core::app::Application;
use gradelink_core::config::Settings;
use gradelink_core::status::Status;
use gradelink_drivers::GpioValvePair;

use super::now_ms;
use crate::can::CanSink;
use crate::channels::{CLICKS, SAVE_REQUEST, SENSORS, STATUS};
use crate::ui;

/// Control tick; finer than every protocol and controller deadline
pub const CONTROL_TICK_MS: u64 = 5;

pub type Valves = GpioValvePair<Output<'static>, Output<'static>>;

#[embassy_executor::task]
pub async fn control_task(mut app: Application<Valves>, mut sink: CanSink) {
    info!("Control task started");

    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_TICK_MS));
    let mut requested: Option<Settings> = None;

    loop {
        ticker.next().await;
        let now = now_ms();

        app.tick(now, &mut sink, &SENSORS, &STATUS);

        while let Some(event) = CLICKS.lock(|queue| queue.borrow_mut().pop()) {
            ui::handle_event(&mut app, event, now);
        }

        if !STATUS.is(Status::NeedSaveSettings) {
            requested = None;
        } else if requested.as_ref() != Some(app.settings()) {
            debug!("Requesting settings save");
            SAVE_REQUEST.signal(app.settings().clone());
            requested = Some(app.settings().clone());
        }
    }
}
