//! Actuator controller
//!
//! The controller is the only code that touches the valve outputs. Each
//! tick it:
//! - Samples the current value into the delay line
//! - Force-closes an expired pulse
//! - Derives at most one event from the status bus, the application mode
//!   and the sensor reading
//! - Runs the entry action for the state the event lands in
//!
//! Every path that energizes a valve releases the opposite one first, so
//! the pair is never energized together.

use gradelink_protocol::SensorMode;

use super::filter::{DelayLine, SAMPLE_PERIOD_MS};
use super::machine::{ControlEvent, ControlState};
use super::{AppMode, Command, Policy, Tuning, ValveDirection};
use crate::config::Settings;
use crate::status::{Status, StatusBus};
use crate::timer::Timer;
use crate::traits::ValveOutputs;

pub struct ActuatorController<V: ValveOutputs> {
    valves: V,
    state: ControlState,
    app_mode: AppMode,
    /// Sensor mode the policy was last tuned for
    tuned_mode: Option<SensorMode>,
    policy: Policy,
    delay_line: DelayLine,
    sample_timer: Timer,
    /// Running while a bounded pulse is active
    valve_timer: Timer,
    pulse_active: bool,
    energized: Option<ValveDirection>,
    last_output_ms: i32,
}

impl<V: ValveOutputs> ActuatorController<V> {
    /// Create a controller in `Init` with both valves released
    pub fn new(mut valves: V, tuning: Tuning) -> Self {
        valves.release();
        Self {
            valves,
            state: ControlState::Init,
            app_mode: AppMode::Manual,
            tuned_mode: None,
            policy: Policy::new(tuning),
            delay_line: DelayLine::new(),
            sample_timer: Timer::new(SAMPLE_PERIOD_MS),
            valve_timer: Timer::new(0),
            pulse_active: false,
            energized: None,
            last_output_ms: 0,
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn app_mode(&self) -> AppMode {
        self.app_mode
    }

    /// Request manual or automatic operation; applied on the next tick
    pub fn set_app_mode(&mut self, mode: AppMode) {
        self.app_mode = mode;
    }

    /// Newest sampled value
    pub fn real_value(&self) -> Option<i16> {
        self.delay_line.real()
    }

    /// Delayed value the policy acts on
    pub fn filtered_value(&self) -> Option<i16> {
        self.delay_line.filtered()
    }

    /// Valve currently commanded on, if any
    pub fn energized(&self) -> Option<ValveDirection> {
        self.energized
    }

    pub fn last_output_ms(&self) -> i32 {
        self.last_output_ms
    }

    pub fn tuning(&self) -> Tuning {
        self.policy.tuning()
    }

    pub fn valves(&self) -> &V {
        &self.valves
    }

    /// Release both valves outside the state machine
    ///
    /// Used by the fatal path right before a reset.
    pub fn force_off(&mut self, bus: &StatusBus) {
        self.stop(bus);
    }

    /// Advance the controller
    ///
    /// `value` is the current reading relative to target, or `None` when no
    /// sensor channel is available.
    pub fn tick(&mut self, now_ms: u32, value: Option<i16>, settings: &Settings, bus: &StatusBus) {
        if let Some(value) = value {
            if self.sample_timer.has_elapsed(now_ms) {
                self.sample_timer.start(now_ms);
                self.delay_line.push(value);
            }
        }

        if self.pulse_active && self.valve_timer.has_elapsed(now_ms) {
            trace!("Pulse finished");
            self.stop(bus);
        }

        let event = match self.state {
            ControlState::Init => self.handle_init(bus),
            ControlState::Manual => self.handle_manual(bus),
            ControlState::Auto => self.handle_auto(now_ms, value, settings, bus),
            ControlState::ForcedUp => self.handle_forced(ValveDirection::Up, bus),
            ControlState::ForcedDown => self.handle_forced(ValveDirection::Down, bus),
            ControlState::Error => self.handle_error(bus),
        };

        if let Some(event) = event {
            self.dispatch(event, settings, bus);
        }
    }

    fn dispatch(&mut self, event: ControlEvent, settings: &Settings, bus: &StatusBus) {
        let previous = self.state;
        let next = previous.transition(event);
        let reentry = matches!(
            (previous, event),
            (ControlState::Manual, ControlEvent::PlateStop)
                | (ControlState::Auto, ControlEvent::Retune)
        );
        if next == previous && !reentry {
            return;
        }

        if next != previous {
            info!("Controller {:?} -> {:?}", previous, next);
        }
        self.state = next;

        match next {
            ControlState::Init => {}
            ControlState::Manual => self.manual_start(bus),
            ControlState::Auto => self.auto_start(settings, bus),
            ControlState::ForcedUp => self.drive(ValveDirection::Up, bus),
            ControlState::ForcedDown => self.drive(ValveDirection::Down, bus),
            ControlState::Error => {
                self.stop(bus);
                self.app_mode = AppMode::Manual;
            }
        }
    }

    fn handle_init(&mut self, bus: &StatusBus) -> Option<ControlEvent> {
        self.stop(bus);
        if bus.has_errors() {
            Some(ControlEvent::ErrorDetected)
        } else if !bus.is(Status::WaitLoad) {
            Some(ControlEvent::Loaded)
        } else {
            None
        }
    }

    fn handle_manual(&mut self, bus: &StatusBus) -> Option<ControlEvent> {
        if bus.has_errors() {
            return Some(ControlEvent::ErrorDetected);
        }
        if self.app_mode == AppMode::Auto {
            return Some(ControlEvent::AutoRequested);
        }

        match (
            bus.is(Status::ManualNeedValveUp),
            bus.is(Status::ManualNeedValveDown),
        ) {
            (true, true) => Some(ControlEvent::PlateStop),
            (true, false) => Some(ControlEvent::PlateUp),
            (false, true) => Some(ControlEvent::PlateDown),
            (false, false) => None,
        }
    }

    fn handle_forced(&mut self, direction: ValveDirection, bus: &StatusBus) -> Option<ControlEvent> {
        if bus.has_errors() {
            return Some(ControlEvent::ErrorDetected);
        }

        let up = bus.is(Status::ManualNeedValveUp);
        let down = bus.is(Status::ManualNeedValveDown);
        let held = match direction {
            ValveDirection::Up => up && !down,
            ValveDirection::Down => down && !up,
        };
        if held && self.app_mode == AppMode::Manual {
            None
        } else {
            Some(ControlEvent::PlateStop)
        }
    }

    fn handle_auto(
        &mut self,
        now_ms: u32,
        value: Option<i16>,
        settings: &Settings,
        bus: &StatusBus,
    ) -> Option<ControlEvent> {
        if bus.has_errors() {
            return Some(ControlEvent::ErrorDetected);
        }
        if self.app_mode == AppMode::Manual {
            return Some(ControlEvent::ManualRequested);
        }

        let Some(value) = value else {
            warn!("Sensor value lost, falling back to manual");
            self.stop(bus);
            self.app_mode = AppMode::Manual;
            return Some(ControlEvent::ManualRequested);
        };

        if self.tuned_mode != Some(settings.sensor_mode()) {
            return Some(ControlEvent::Retune);
        }

        let input = self.delay_line.filtered().unwrap_or(value);
        let (command, output) = self.policy.step(input, now_ms);
        if command != Command::Hold {
            self.last_output_ms = output;
        }
        self.apply(command, now_ms, bus);
        None
    }

    fn handle_error(&mut self, bus: &StatusBus) -> Option<ControlEvent> {
        self.stop(bus);
        if bus.has_errors() {
            None
        } else {
            Some(ControlEvent::ErrorsCleared)
        }
    }

    fn manual_start(&mut self, bus: &StatusBus) {
        self.stop(bus);
        self.delay_line.collapse();
    }

    fn auto_start(&mut self, settings: &Settings, bus: &StatusBus) {
        self.stop(bus);
        let mode = settings.sensor_mode();
        self.policy.retune(settings.tuning(mode));
        self.tuned_mode = Some(mode);
        self.last_output_ms = 0;
        self.delay_line
            .refill(DelayLine::length_for(settings.work_delay_s(mode)));
        debug!("Tuned for {:?}", mode);
    }

    fn apply(&mut self, command: Command, now_ms: u32, bus: &StatusBus) {
        match command {
            Command::Hold => {}
            Command::Stop => self.stop(bus),
            Command::Drive(direction) => {
                self.drive(direction, bus);
            }
            Command::Pulse {
                direction,
                duration_ms,
            } => {
                self.drive(direction, bus);
                self.valve_timer.start_with(now_ms, duration_ms);
                self.pulse_active = true;
            }
        }
    }

    /// Energize one valve, releasing the other first
    fn drive(&mut self, direction: ValveDirection, bus: &StatusBus) {
        self.pulse_active = false;
        match direction {
            ValveDirection::Up => {
                self.valves.set_down(false);
                self.valves.set_up(true);
            }
            ValveDirection::Down => {
                self.valves.set_up(false);
                self.valves.set_down(true);
            }
        }
        self.energized = Some(direction);

        if self.state == ControlState::Auto {
            bus.assign(Status::AutoNeedValveUp, direction == ValveDirection::Up);
            bus.assign(Status::AutoNeedValveDown, direction == ValveDirection::Down);
        }
    }

    fn stop(&mut self, bus: &StatusBus) {
        self.valves.release();
        self.energized = None;
        self.pulse_active = false;
        bus.reset(Status::AutoNeedValveUp);
        bus.reset(Status::AutoNeedValveDown);
    }
}
