//! Front panel actions
//!
//! Up and Down jog the plate through the manual statuses the button task
//! maintains; the remaining buttons map onto application commands here.

use defmt::*;

use gradelink_core::app::Application;
use gradelink_core::control::AppMode;
use gradelink_core::input::{ButtonEvent, PressKind};
use gradelink_core::traits::{Button, ValveOutputs};
use gradelink_protocol::SensorMode;

use crate::channels::{SENSORS, STATUS};

pub fn handle_event<V: ValveOutputs>(app: &mut Application<V>, event: ButtonEvent, now_ms: u32) {
    match (event.button, event.kind) {
        (Button::Mode, PressKind::Click) => {
            let mode = match app.controller().app_mode() {
                AppMode::Manual => AppMode::Auto,
                AppMode::Auto => AppMode::Manual,
            };
            info!("App mode {:?}", mode);
            app.set_app_mode(mode);
        }
        (Button::Enter, PressKind::Click) => {
            if !app.save_target(&SENSORS, now_ms, &STATUS) {
                debug!("Target not saved");
            }
        }
        (Button::Enter, PressKind::Hold) => app.reset_target(&STATUS),
        (Button::F1, PressKind::Click) => app.change_sensor_mode(SensorMode::Surface, &STATUS),
        (Button::F2, PressKind::Click) => app.change_sensor_mode(SensorMode::String, &STATUS),
        (Button::F3, PressKind::Click) => app.change_sensor_mode(SensorMode::BigSki, &STATUS),
        _ => {}
    }
}
