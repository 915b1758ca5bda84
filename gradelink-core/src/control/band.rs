//! Dead-band / proportional-band policy
//!
//! Classifies the reading against two bands around the target:
//!
//! ```text
//!   |value| <= dead_band              stop
//!   dead_band < |value| <= prop_band  one pulse per cycle
//!   |value| > prop_band               drive continuously toward target
//! ```
//!
//! On entering the proportional band the policy stops and waits the
//! sensitivity delay before its first pulse.

use super::{Command, ValveDirection, MIN_PULSE_MS};
use crate::timer::Timer;

/// Proportional cycle length
pub const CYCLE_MS: u32 = 1100;

/// Band policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BandConfig {
    /// Half-width of the on-target band (1/100 mm)
    pub dead_band: u16,
    /// Half-width of the proportional band (1/100 mm)
    pub prop_band: u16,
    /// Wait after entering the proportional band
    pub sensitivity_delay_ms: u32,
    pub cycle_ms: u32,
    pub min_pulse_ms: u32,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            dead_band: 50,
            prop_band: 180,
            sensitivity_delay_ms: 500,
            cycle_ms: CYCLE_MS,
            min_pulse_ms: MIN_PULSE_MS,
        }
    }
}

/// Which band the last reading fell in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BandPosition {
    Unknown,
    Dead,
    Proportional,
    Outside,
}

#[derive(Debug, Clone)]
pub struct BandPolicy {
    config: BandConfig,
    position: BandPosition,
    delay_timer: Timer,
    cycle_timer: Timer,
}

impl BandPolicy {
    pub fn new(config: BandConfig) -> Self {
        Self {
            config,
            position: BandPosition::Unknown,
            delay_timer: Timer::new(config.sensitivity_delay_ms),
            cycle_timer: Timer::new(config.cycle_ms),
        }
    }

    pub fn retune(&mut self, config: BandConfig) {
        *self = Self::new(config);
    }

    pub fn config(&self) -> &BandConfig {
        &self.config
    }

    pub fn position(&self) -> BandPosition {
        self.position
    }

    /// Pulse length for a reading inside the proportional band
    pub fn pulse_ms(&self, value: i16) -> u32 {
        let prop_band = self.config.prop_band as u32;
        if prop_band == 0 {
            return 0;
        }
        let remaining = prop_band.abs_diff(value.unsigned_abs() as u32);
        let percent = remaining * 100 / prop_band;
        percent * self.config.cycle_ms / 100
    }

    /// Decide the valve command for a reading relative to target
    pub fn step(&mut self, value: i16, now_ms: u32) -> Command {
        let magnitude = value.unsigned_abs();
        let toward_target = if value > 0 {
            ValveDirection::Down
        } else {
            ValveDirection::Up
        };

        if magnitude <= self.config.dead_band {
            self.position = BandPosition::Dead;
            return Command::Stop;
        }

        if magnitude > self.config.prop_band {
            self.position = BandPosition::Outside;
            return Command::Drive(toward_target);
        }

        if self.position != BandPosition::Proportional {
            self.position = BandPosition::Proportional;
            self.delay_timer.start(now_ms);
            self.cycle_timer.reset();
            return Command::Stop;
        }

        if !self.delay_timer.has_elapsed(now_ms) || !self.cycle_timer.has_elapsed(now_ms) {
            return Command::Hold;
        }

        let duration_ms = match self.pulse_ms(value) {
            0 => return Command::Hold,
            ms => ms.max(self.config.min_pulse_ms),
        };

        self.cycle_timer.start(now_ms);
        Command::Pulse {
            direction: toward_target,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BandPolicy {
        BandPolicy::new(BandConfig {
            dead_band: 50,
            prop_band: 180,
            sensitivity_delay_ms: 500,
            ..BandConfig::default()
        })
    }

    #[test]
    fn test_dead_band_stops() {
        let mut policy = policy();
        assert_eq!(policy.step(50, 0), Command::Stop);
        assert_eq!(policy.step(-50, 10), Command::Stop);
        assert_eq!(policy.position(), BandPosition::Dead);
    }

    #[test]
    fn test_outside_drives_toward_target() {
        let mut policy = policy();
        assert_eq!(policy.step(181, 0), Command::Drive(ValveDirection::Down));
        assert_eq!(policy.step(-500, 10), Command::Drive(ValveDirection::Up));
        assert_eq!(policy.position(), BandPosition::Outside);
    }

    #[test]
    fn test_prop_band_waits_sensitivity_delay() {
        let mut policy = policy();
        // Entry stops and arms the delay
        assert_eq!(policy.step(90, 0), Command::Stop);
        assert_eq!(policy.step(90, 499), Command::Hold);

        // (180 - 90) / 180 = 50% of 1100 ms
        assert_eq!(
            policy.step(90, 500),
            Command::Pulse {
                direction: ValveDirection::Down,
                duration_ms: 550
            }
        );
    }

    #[test]
    fn test_prop_band_one_pulse_per_cycle() {
        let mut policy = policy();
        policy.step(-90, 0);
        assert!(matches!(policy.step(-90, 500), Command::Pulse { .. }));
        assert_eq!(policy.step(-90, 1000), Command::Hold);
        assert_eq!(policy.step(-90, 1599), Command::Hold);
        assert_eq!(
            policy.step(-90, 1600),
            Command::Pulse {
                direction: ValveDirection::Up,
                duration_ms: 550
            }
        );
    }

    #[test]
    fn test_short_pulse_raised_to_minimum() {
        let mut policy = policy();
        policy.step(175, 0);
        // (180 - 175) / 180 = 2% → 22 ms, raised to 100 ms
        assert_eq!(
            policy.step(175, 500),
            Command::Pulse {
                direction: ValveDirection::Down,
                duration_ms: MIN_PULSE_MS
            }
        );
    }

    #[test]
    fn test_reentry_rearms_delay() {
        let mut policy = policy();
        policy.step(90, 0);
        policy.step(90, 500);
        assert_eq!(policy.step(10, 600), Command::Stop);
        assert_eq!(policy.step(90, 700), Command::Stop);
        assert_eq!(policy.step(90, 1100), Command::Hold);
        assert!(matches!(policy.step(90, 1200), Command::Pulse { .. }));
    }

    #[test]
    fn test_pulse_edge_of_band() {
        let policy = policy();
        assert_eq!(policy.pulse_ms(180), 0);
        assert_eq!(policy.pulse_ms(51), 1100 * 71 / 100);
    }
}
