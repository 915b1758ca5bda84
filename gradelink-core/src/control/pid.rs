//! PID valve-time policy
//!
//! Turns the distance error into a signed valve opening time. Positive
//! output raises the plate, negative lowers it. Uses fixed-point math
//! since the target has no FPU.

use super::fixed::Fixed32;
use super::{Command, ValveDirection, MIN_PULSE_MS};
use crate::timer::Timer;

/// PID coefficients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidCoefficients {
    pub kp: Fixed32,
    pub ki: Fixed32,
    pub kd: Fixed32,
}

impl PidCoefficients {
    /// Create coefficients from scaled integers (value × 100)
    pub const fn from_scaled_100(kp_x100: i16, ki_x100: i16, kd_x100: i16) -> Self {
        Self {
            kp: Fixed32::from_scaled_100(kp_x100),
            ki: Fixed32::from_scaled_100(ki_x100),
            kd: Fixed32::from_scaled_100(kd_x100),
        }
    }
}

/// PID policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidConfig {
    /// Proportional gain (value × 100)
    pub kp_x100: i16,
    /// Integral gain (value × 100)
    pub ki_x100: i16,
    /// Derivative gain (value × 100)
    pub kd_x100: i16,
    /// Time between samples
    pub sampling_ms: u16,
    /// Output clamp in either direction
    pub max_output_ms: u16,
    /// Outputs shorter than this cause no motion
    pub min_pulse_ms: u32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp_x100: 55,
            ki_x100: 0,
            kd_x100: 0,
            sampling_ms: 50,
            max_output_ms: 1000,
            min_pulse_ms: MIN_PULSE_MS,
        }
    }
}

impl PidConfig {
    pub fn coefficients(&self) -> PidCoefficients {
        PidCoefficients::from_scaled_100(self.kp_x100, self.ki_x100, self.kd_x100)
    }
}

/// PID internal state
#[derive(Debug, Clone, Copy, Default)]
struct PidState {
    /// Accumulated integral term (ms)
    integral: Fixed32,
    /// Previous error for derivative calculation
    prev_error: i16,
}

/// PID controller producing valve time in milliseconds
#[derive(Debug, Clone)]
pub struct Pid {
    config: PidConfig,
    coefficients: PidCoefficients,
    state: PidState,
}

impl Pid {
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            coefficients: config.coefficients(),
            state: PidState::default(),
        }
    }

    /// Replace the configuration and clear integral/derivative history
    pub fn retune(&mut self, config: PidConfig) {
        self.config = config;
        self.coefficients = config.coefficients();
        self.reset();
    }

    pub fn reset(&mut self) {
        self.state = PidState::default();
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// Compute the signed output for `error` (1/100 mm), clamped to
    /// `±max_output_ms`
    pub fn update(&mut self, error: i16) -> i32 {
        let limit = Fixed32::from_int(self.config.max_output_ms.min(i16::MAX as u16) as i16);
        let coeffs = &self.coefficients;
        let error_fx = Fixed32::from_int(error);

        // P = Kp * error
        let p_term = coeffs.kp.mul(error_fx);

        // I += Ki * error, clamped to the output range
        self.state.integral = self
            .state
            .integral
            .saturating_add(coeffs.ki.mul(error_fx))
            .clamp(-limit, limit);

        // D = Kd * (error - prev_error)
        let d_error = (error as i32 - self.state.prev_error as i32)
            .clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        let d_term = coeffs.kd.mul(Fixed32::from_int(d_error));
        self.state.prev_error = error;

        p_term
            .saturating_add(self.state.integral)
            .saturating_add(d_term)
            .clamp(-limit, limit)
            .to_int()
    }
}

/// PID policy: sample every `sampling_ms`, pulse for `|output|` ms
#[derive(Debug, Clone)]
pub struct PidPolicy {
    pid: Pid,
    sample_timer: Timer,
}

impl PidPolicy {
    pub fn new(config: PidConfig) -> Self {
        Self {
            pid: Pid::new(config),
            sample_timer: Timer::new(config.sampling_ms as u32),
        }
    }

    /// Apply a new configuration; resets the integral term
    pub fn retune(&mut self, config: PidConfig) {
        self.pid.retune(config);
        self.sample_timer = Timer::new(config.sampling_ms as u32);
    }

    pub fn config(&self) -> &PidConfig {
        self.pid.config()
    }

    /// Decide the valve command for a reading relative to target
    pub fn step(&mut self, value: i16, now_ms: u32) -> (Command, i32) {
        if !self.sample_timer.has_elapsed(now_ms) {
            return (Command::Hold, 0);
        }
        self.sample_timer.start(now_ms);

        // Readings are relative to the programmed target, so the setpoint is 0
        let output = self.pid.update(value.saturating_neg());
        let magnitude = output.unsigned_abs();

        if magnitude == 0 || magnitude < self.pid.config().min_pulse_ms {
            return (Command::Stop, output);
        }

        let direction = if output > 0 {
            ValveDirection::Up
        } else {
            ValveDirection::Down
        };
        (
            Command::Pulse {
                direction,
                duration_ms: magnitude,
            },
            output,
        )
    }
}
