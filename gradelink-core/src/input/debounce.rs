//! Button debouncing
//!
//! A level change is accepted once two consecutive samples agree, so a
//! bounce shorter than one sample period never reaches the UI.

use super::queue::{ButtonEvent, ClickQueue, PressKind};
use crate::status::{Status, StatusBus};
use crate::timer::Timer;
use crate::traits::{Button, ButtonInputs};

/// Sampling period
pub const DEBOUNCE_MS: u32 = 20;

/// Press duration reported as a hold
pub const HOLD_MS: u32 = 1000;

#[derive(Debug, Clone, Copy, Default)]
struct ButtonState {
    /// Last raw sample
    raw: bool,
    /// Debounced level
    pressed: bool,
    pressed_at_ms: u32,
    /// Hold already reported for this press
    held: bool,
}

impl ButtonState {
    /// Feed one sample; returns the event it completes, if any
    fn sample(&mut self, raw: bool, now_ms: u32) -> Option<PressKind> {
        let stable = raw == self.raw;
        self.raw = raw;

        if stable && raw != self.pressed {
            self.pressed = raw;
            if raw {
                self.pressed_at_ms = now_ms;
                self.held = false;
                return None;
            }
            return Some(PressKind::Click);
        }

        if self.pressed && !self.held && now_ms.wrapping_sub(self.pressed_at_ms) >= HOLD_MS {
            self.held = true;
            return Some(PressKind::Hold);
        }
        None
    }
}

/// Debounced state of every front panel button
#[derive(Debug)]
pub struct ButtonPanel {
    states: [ButtonState; Button::COUNT],
    sample_timer: Timer,
}

impl Default for ButtonPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonPanel {
    pub const fn new() -> Self {
        Self {
            states: [ButtonState {
                raw: false,
                pressed: false,
                pressed_at_ms: 0,
                held: false,
            }; Button::COUNT],
            sample_timer: Timer::new(DEBOUNCE_MS),
        }
    }

    /// Debounced level of `button`
    pub fn is_pressed(&self, button: Button) -> bool {
        self.states[button.index()].pressed
    }

    /// Sample the buttons if a period has passed
    ///
    /// Completed clicks and holds are queued, and the up/down levels are
    /// mirrored into the manual jog statuses.
    pub fn poll<I: ButtonInputs>(
        &mut self,
        now_ms: u32,
        inputs: &mut I,
        queue: &mut ClickQueue,
        bus: &StatusBus,
    ) {
        if !self.sample_timer.has_elapsed(now_ms) {
            return;
        }
        self.sample_timer.start(now_ms);

        for button in Button::ALL {
            let raw = inputs.is_pressed(button);
            if let Some(kind) = self.states[button.index()].sample(raw, now_ms) {
                trace!("{:?} {:?}", button, kind);
                queue.push(ButtonEvent { button, kind });
            }
        }

        bus.assign(Status::ManualNeedValveUp, self.is_pressed(Button::Up));
        bus.assign(Status::ManualNeedValveDown, self.is_pressed(Button::Down));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockInputs {
        pressed: [bool; Button::COUNT],
    }

    impl MockInputs {
        fn set(&mut self, button: Button, pressed: bool) {
            self.pressed[button.index()] = pressed;
        }
    }

    impl ButtonInputs for MockInputs {
        fn is_pressed(&mut self, button: Button) -> bool {
            self.pressed[button.index()]
        }
    }

    struct Harness {
        panel: ButtonPanel,
        inputs: MockInputs,
        queue: ClickQueue,
        bus: StatusBus,
        now: u32,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                panel: ButtonPanel::new(),
                inputs: MockInputs::default(),
                queue: ClickQueue::new(),
                bus: StatusBus::new(),
                now: 0,
            }
        }

        /// Run `count` sample periods
        fn run(&mut self, count: u32) {
            for _ in 0..count {
                self.panel
                    .poll(self.now, &mut self.inputs, &mut self.queue, &self.bus);
                self.now += DEBOUNCE_MS;
            }
        }
    }

    #[test]
    fn test_click() {
        let mut h = Harness::new();
        h.inputs.set(Button::Enter, true);
        h.run(1);
        assert!(!h.panel.is_pressed(Button::Enter));
        h.run(1);
        assert!(h.panel.is_pressed(Button::Enter));
        assert!(h.queue.is_empty());

        h.inputs.set(Button::Enter, false);
        h.run(2);
        assert!(!h.panel.is_pressed(Button::Enter));
        assert_eq!(
            h.queue.pop(),
            Some(ButtonEvent {
                button: Button::Enter,
                kind: PressKind::Click
            })
        );
    }

    #[test]
    fn test_bounce_ignored() {
        let mut h = Harness::new();
        for _ in 0..5 {
            h.inputs.set(Button::F1, true);
            h.run(1);
            h.inputs.set(Button::F1, false);
            h.run(1);
        }
        assert!(!h.panel.is_pressed(Button::F1));
        assert!(h.queue.is_empty());
    }

    #[test]
    fn test_hold_reported_once_then_click() {
        let mut h = Harness::new();
        h.inputs.set(Button::F2, true);
        h.run(2);
        // Accepted at 20 ms; hold due at 1020 ms
        h.run(49);
        assert!(h.queue.is_empty());
        h.run(1);
        assert_eq!(
            h.queue.pop(),
            Some(ButtonEvent {
                button: Button::F2,
                kind: PressKind::Hold
            })
        );

        h.run(100);
        assert!(h.queue.is_empty());

        // Release still ends the gesture with a click
        h.inputs.set(Button::F2, false);
        h.run(2);
        assert_eq!(
            h.queue.pop(),
            Some(ButtonEvent {
                button: Button::F2,
                kind: PressKind::Click
            })
        );
    }

    #[test]
    fn test_jog_statuses_follow_up_down() {
        let mut h = Harness::new();
        h.inputs.set(Button::Up, true);
        h.run(2);
        assert!(h.bus.is(Status::ManualNeedValveUp));
        assert!(!h.bus.is(Status::ManualNeedValveDown));

        h.inputs.set(Button::Down, true);
        h.run(2);
        assert!(h.bus.is(Status::ManualNeedValveDown));

        h.inputs.set(Button::Up, false);
        h.inputs.set(Button::Down, false);
        h.run(2);
        assert!(!h.bus.is(Status::ManualNeedValveUp));
        assert!(!h.bus.is(Status::ManualNeedValveDown));
    }

    #[test]
    fn test_samples_only_every_period() {
        let mut h = Harness::new();
        h.inputs.set(Button::Mode, true);
        h.panel.poll(0, &mut h.inputs, &mut h.queue, &h.bus);
        h.panel.poll(5, &mut h.inputs, &mut h.queue, &h.bus);
        assert!(!h.panel.is_pressed(Button::Mode));
        h.panel.poll(20, &mut h.inputs, &mut h.queue, &h.bus);
        assert!(h.panel.is_pressed(Button::Mode));
    }
}
