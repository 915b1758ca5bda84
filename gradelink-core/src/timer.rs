//! Millisecond deadline timers
//!
//! Timers never block; callers poll `has_elapsed` with the current time.
//! Time is a wrapping `u32` millisecond counter (about 49 days per wrap),
//! so comparisons use wrapping differences.

/// Polled deadline timer
///
/// A timer that was never started, or was reset, counts as elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timer {
    start_ms: Option<u32>,
    delay_ms: u32,
}

impl Timer {
    /// Create an expired timer with the given period
    pub const fn new(delay_ms: u32) -> Self {
        Self {
            start_ms: None,
            delay_ms,
        }
    }

    /// Arm the timer at `now_ms`
    pub fn start(&mut self, now_ms: u32) {
        self.start_ms = Some(now_ms);
    }

    /// Arm the timer with a new period
    pub fn start_with(&mut self, now_ms: u32, delay_ms: u32) {
        self.delay_ms = delay_ms;
        self.start_ms = Some(now_ms);
    }

    /// Expire the timer immediately
    pub fn reset(&mut self) {
        self.start_ms = None;
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// True once `delay_ms` has passed since the last start
    pub fn has_elapsed(&self, now_ms: u32) -> bool {
        self.remaining(now_ms) == 0
    }

    /// Milliseconds left before the deadline
    pub fn remaining(&self, now_ms: u32) -> u32 {
        match self.start_ms {
            Some(start_ms) => self.delay_ms.saturating_sub(now_ms.wrapping_sub(start_ms)),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed() {
        let mut timer = Timer::new(100);
        timer.start(1000);
        assert!(!timer.has_elapsed(1000));
        assert!(!timer.has_elapsed(1099));
        assert!(timer.has_elapsed(1100));
        assert_eq!(timer.remaining(1040), 60);
        assert_eq!(timer.remaining(1200), 0);
    }

    #[test]
    fn test_unstarted_and_reset_are_elapsed() {
        let mut timer = Timer::new(100);
        assert!(timer.has_elapsed(0));

        timer.start(0);
        assert!(!timer.has_elapsed(10));
        timer.reset();
        assert!(timer.has_elapsed(10));
    }

    #[test]
    fn test_elapsed_across_wrap() {
        let mut timer = Timer::new(100);
        timer.start(u32::MAX - 49);
        assert!(!timer.has_elapsed(u32::MAX));
        assert!(!timer.has_elapsed(49));
        assert!(timer.has_elapsed(50));
    }

    #[test]
    fn test_restart_with_new_period() {
        let mut timer = Timer::new(100);
        timer.start_with(0, 400);
        assert!(!timer.has_elapsed(399));
        assert!(timer.has_elapsed(400));
        assert_eq!(timer.delay_ms(), 400);
    }
}
