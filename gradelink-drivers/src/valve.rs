//! GPIO valve pair
//!
//! Two solenoid drivers, one per direction, each on its own GPIO pin
//! (directly or via a MOSFET/relay board).

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use gradelink_core::traits::ValveOutputs;

/// Raise/lower solenoids on two GPIO pins
///
/// Pins may be active-high (default) or active-low. Both valves are
/// released on construction.
pub struct GpioValvePair<U, D> {
    up: U,
    down: D,
    /// If true, valve ON = pin LOW
    inverted: bool,
}

impl<U, D> GpioValvePair<U, D>
where
    U: OutputPin<Error = Infallible>,
    D: OutputPin<Error = Infallible>,
{
    /// Create a valve pair
    ///
    /// # Arguments
    /// - `up`: Raise solenoid pin
    /// - `down`: Lower solenoid pin
    /// - `inverted`: If true, a valve is energized when its pin is LOW
    pub fn new(up: U, down: D, inverted: bool) -> Self {
        let mut pair = Self { up, down, inverted };
        pair.release();
        pair
    }

    pub fn new_active_high(up: U, down: D) -> Self {
        Self::new(up, down, false)
    }

    pub fn new_active_low(up: U, down: D) -> Self {
        Self::new(up, down, true)
    }
}

fn drive<P: OutputPin<Error = Infallible>>(pin: &mut P, energized: bool, inverted: bool) {
    let result = if energized != inverted {
        pin.set_high()
    } else {
        pin.set_low()
    };
    match result {
        Ok(()) => {}
        Err(never) => match never {},
    }
}

impl<U, D> ValveOutputs for GpioValvePair<U, D>
where
    U: OutputPin<Error = Infallible>,
    D: OutputPin<Error = Infallible>,
{
    fn set_up(&mut self, energized: bool) {
        drive(&mut self.up, energized, self.inverted);
    }

    fn set_down(&mut self, energized: bool) {
        drive(&mut self.down, energized, self.inverted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::ErrorType;

    /// Mock GPIO pin for testing
    struct MockPin {
        high: bool,
    }

    impl MockPin {
        fn new(high: bool) -> Self {
            Self { high }
        }
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }
    }

    #[test]
    fn test_active_high_pair() {
        let mut valves = GpioValvePair::new_active_high(MockPin::new(true), MockPin::new(true));

        // Released on construction
        assert!(!valves.up.high);
        assert!(!valves.down.high);

        valves.set_up(true);
        assert!(valves.up.high);
        assert!(!valves.down.high);

        valves.set_up(false);
        valves.set_down(true);
        assert!(!valves.up.high);
        assert!(valves.down.high);
    }

    #[test]
    fn test_active_low_pair() {
        let mut valves = GpioValvePair::new_active_low(MockPin::new(false), MockPin::new(false));

        // Released means pins high
        assert!(valves.up.high);
        assert!(valves.down.high);

        valves.set_down(true);
        assert!(!valves.down.high);

        valves.release();
        assert!(valves.up.high);
        assert!(valves.down.high);
    }
}
