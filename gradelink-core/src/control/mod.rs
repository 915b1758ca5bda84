//! Actuator control
//!
//! Turns filtered distance readings into valve commands. Two policies are
//! available: a PID loop producing timed pulses, and a simpler dead-band /
//! proportional-band classifier. Both honor the same minimum pulse and are
//! executed by [`ActuatorController`], which alone touches the valves.

pub mod band;
pub mod controller;
pub mod filter;
pub mod fixed;
pub mod machine;
pub mod pid;

pub use band::{BandConfig, BandPolicy, BandPosition};
pub use controller::ActuatorController;
pub use filter::DelayLine;
pub use machine::{ControlEvent, ControlState};
pub use pid::{PidConfig, PidPolicy};

/// Shortest valve pulse the hydraulics respond to
pub const MIN_PULSE_MS: u32 = 100;

/// Which valve to energize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValveDirection {
    Up,
    Down,
}

/// Output of a control policy step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Leave the outputs as they are
    Hold,
    /// Release both valves
    Stop,
    /// Energize one valve until told otherwise
    Drive(ValveDirection),
    /// Energize one valve for a bounded time
    Pulse {
        direction: ValveDirection,
        duration_ms: u32,
    },
}

/// Operator-selected mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppMode {
    #[default]
    Manual,
    Auto,
}

/// Policy parameters for one sensor mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tuning {
    Pid(PidConfig),
    Band(BandConfig),
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning::Pid(PidConfig::default())
    }
}

/// Active control policy
#[derive(Debug, Clone)]
pub enum Policy {
    Pid(PidPolicy),
    Band(BandPolicy),
}

impl Policy {
    pub fn new(tuning: Tuning) -> Self {
        match tuning {
            Tuning::Pid(config) => Policy::Pid(PidPolicy::new(config)),
            Tuning::Band(config) => Policy::Band(BandPolicy::new(config)),
        }
    }

    /// Switch to `tuning`, clearing all policy history
    pub fn retune(&mut self, tuning: Tuning) {
        match (self, tuning) {
            (Policy::Pid(policy), Tuning::Pid(config)) => policy.retune(config),
            (Policy::Band(policy), Tuning::Band(config)) => policy.retune(config),
            (policy, tuning) => *policy = Policy::new(tuning),
        }
    }

    pub fn tuning(&self) -> Tuning {
        match self {
            Policy::Pid(policy) => Tuning::Pid(*policy.config()),
            Policy::Band(policy) => Tuning::Band(*policy.config()),
        }
    }

    /// Returns the command and the signed output it was derived from
    /// (PID only; the band policy reports the pulse it issued)
    pub fn step(&mut self, value: i16, now_ms: u32) -> (Command, i32) {
        match self {
            Policy::Pid(policy) => policy.step(value, now_ms),
            Policy::Band(policy) => {
                let command = policy.step(value, now_ms);
                let output = match command {
                    Command::Pulse {
                        direction: ValveDirection::Up,
                        duration_ms,
                    } => duration_ms as i32,
                    Command::Pulse {
                        direction: ValveDirection::Down,
                        duration_ms,
                    } => -(duration_ms as i32),
                    _ => 0,
                };
                (command, output)
            }
        }
    }
}
