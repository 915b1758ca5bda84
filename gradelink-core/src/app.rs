//! Application facade
//!
//! Bundles the sensor link, the actuator controller and the settings so a
//! single task can drive them, and gives the UI a narrow surface: a
//! snapshot for display plus a handful of operator commands.

use gradelink_protocol::{Direction, SensorMode, SensorNode};

use crate::config::{Settings, TARGETS_PER_MODE};
use crate::control::{ActuatorController, AppMode, ControlState, Tuning, ValveDirection};
use crate::link::{SensorBank, SensorLink};
use crate::status::{Status, StatusBus};
use crate::traits::{FrameSink, ValveOutputs};

/// What the UI shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppView {
    pub real_value: Option<i16>,
    pub filtered_value: Option<i16>,
    pub targets: [i16; TARGETS_PER_MODE],
    pub sensor_mode: SensorMode,
    pub app_mode: AppMode,
    pub state: ControlState,
    pub tuning: Tuning,
    pub last_output_ms: i32,
    pub energized: Option<ValveDirection>,
    /// Availability per node, indexed by `SensorNode::index`
    pub channels: [bool; 3],
    pub direction: Direction,
    /// Sensor unit runs the requested mode and targets
    pub link_synced: bool,
}

pub struct Application<V: ValveOutputs> {
    settings: Settings,
    link: SensorLink,
    controller: ActuatorController<V>,
    /// Swallow the save that ends a hold-to-reset gesture
    skip_next_save: bool,
}

impl<V: ValveOutputs> Application<V> {
    pub fn new(settings: Settings, valves: V) -> Self {
        let mode = settings.sensor_mode();
        let link = SensorLink::new(mode, settings.targets(mode));
        let controller = ActuatorController::new(valves, settings.tuning(mode));
        Self {
            settings,
            link,
            controller,
            skip_next_save: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn link(&self) -> &SensorLink {
        &self.link
    }

    pub fn controller(&self) -> &ActuatorController<V> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ActuatorController<V> {
        &mut self.controller
    }

    /// Advance the link and the controller once
    ///
    /// The link is held while any error is active; the controller still
    /// runs so it can halt the valves. Lapsed channels are expired on every
    /// tick, faulted or not.
    pub fn tick<S: FrameSink>(
        &mut self,
        now_ms: u32,
        sink: &mut S,
        sensors: &SensorBank,
        bus: &StatusBus,
    ) {
        sensors.expire_stale(now_ms);
        if !bus.has_errors() {
            self.link.tick(now_ms, sink, sensors, bus);
        }

        let value = sensors.current_value(self.link.requested_mode(), now_ms);
        self.controller.tick(now_ms, value, &self.settings, bus);

        if let Some(filtered) = self.controller.filtered_value() {
            self.link.set_feedback_value(filtered);
        }
    }

    /// Snapshot for display
    pub fn view(&self, sensors: &SensorBank, now_ms: u32) -> AppView {
        let mode = self.settings.sensor_mode();
        AppView {
            real_value: self.controller.real_value(),
            filtered_value: self.controller.filtered_value(),
            targets: self.settings.targets(mode),
            sensor_mode: mode,
            app_mode: self.controller.app_mode(),
            state: self.controller.state(),
            tuning: self.controller.tuning(),
            last_output_ms: self.controller.last_output_ms(),
            energized: self.controller.energized(),
            channels: SensorNode::ALL.map(|node| sensors.channel(node).is_available(now_ms)),
            direction: sensors.channel(SensorNode::Primary).direction(),
            link_synced: self.link.is_synced(),
        }
    }

    pub fn set_app_mode(&mut self, mode: AppMode) {
        self.controller.set_app_mode(mode);
    }

    /// Switch the sensor unit to another measuring mode
    pub fn change_sensor_mode(&mut self, mode: SensorMode, bus: &StatusBus) {
        if mode == self.settings.sensor_mode() {
            return;
        }
        info!("Sensor mode {:?}", mode);
        self.settings.sensor_mode = mode.code();
        self.link.request_mode(mode);
        self.link.request_targets(self.settings.targets(mode));
        bus.set(Status::NeedSaveSettings);
    }

    /// Make the current position the new target
    ///
    /// Returns `false` if nothing was saved: either no reading is available
    /// or the save directly follows a reset.
    pub fn save_target(&mut self, sensors: &SensorBank, now_ms: u32, bus: &StatusBus) -> bool {
        if self.skip_next_save {
            self.skip_next_save = false;
            return false;
        }

        let mode = self.settings.sensor_mode();
        let mut targets = self.settings.targets(mode);

        if mode.is_multi() {
            let mut any = false;
            for node in mode.nodes() {
                if let Some(reading) = sensors.channel(*node).reading(now_ms) {
                    let target = &mut targets[node.index()];
                    *target = target.saturating_add(reading);
                    any = true;
                }
            }
            if !any {
                return false;
            }
        } else {
            let Some(real) = self.controller.real_value() else {
                return false;
            };
            targets[0] = targets[0].saturating_add(real);
        }

        info!("Target saved for {:?}", mode);
        self.store_targets(mode, targets, bus);
        true
    }

    /// Zero the targets of the active mode
    pub fn reset_target(&mut self, bus: &StatusBus) {
        let mode = self.settings.sensor_mode();
        info!("Target reset for {:?}", mode);
        self.store_targets(mode, [0; TARGETS_PER_MODE], bus);
        self.skip_next_save = true;
    }

    fn store_targets(&mut self, mode: SensorMode, targets: [i16; TARGETS_PER_MODE], bus: &StatusBus) {
        self.settings.mode_mut(mode).targets = targets;
        self.link.request_targets(self.settings.targets(mode));
        bus.set(Status::NeedSaveSettings);
    }
}
