//! GPIO front panel buttons

use core::convert::Infallible;

use embedded_hal::digital::InputPin;
use gradelink_core::traits::{Button, ButtonInputs};

/// Seven buttons on GPIO inputs, indexed by `Button::index`
///
/// Buttons usually pull their pin to ground against a pull-up, so the
/// default is active-low.
pub struct GpioButtons<P> {
    pins: [P; Button::COUNT],
    active_low: bool,
}

impl<P: InputPin<Error = Infallible>> GpioButtons<P> {
    pub fn new(pins: [P; Button::COUNT], active_low: bool) -> Self {
        Self { pins, active_low }
    }

    pub fn new_active_low(pins: [P; Button::COUNT]) -> Self {
        Self::new(pins, true)
    }
}

impl<P: InputPin<Error = Infallible>> ButtonInputs for GpioButtons<P> {
    fn is_pressed(&mut self, button: Button) -> bool {
        let pin = &mut self.pins[button.index()];
        let level = if self.active_low {
            pin.is_low()
        } else {
            pin.is_high()
        };
        match level {
            Ok(pressed) => pressed,
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::ErrorType;

    #[derive(Clone, Copy)]
    struct MockPin {
        high: bool,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl InputPin for MockPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.high)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.high)
        }
    }

    #[test]
    fn test_active_low_buttons() {
        let mut pins = [MockPin { high: true }; Button::COUNT];
        pins[Button::Enter.index()].high = false;
        let mut buttons = GpioButtons::new_active_low(pins);

        assert!(buttons.is_pressed(Button::Enter));
        assert!(!buttons.is_pressed(Button::Up));
    }

    #[test]
    fn test_active_high_buttons() {
        let mut pins = [MockPin { high: false }; Button::COUNT];
        pins[Button::F3.index()].high = true;
        let mut buttons = GpioButtons::new(pins, false);

        assert!(buttons.is_pressed(Button::F3));
        assert!(!buttons.is_pressed(Button::Down));
    }
}
