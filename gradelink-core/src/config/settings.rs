//! Persisted device settings
//!
//! Settings are stored in flash as postcard-serialized binary data and
//! validated on load. A record that fails validation is repaired: the
//! firmware id is upgraded in place, and if that is not enough the record is
//! reset to compiled defaults. Either way the record is flagged for saving.

use gradelink_protocol::SensorMode;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::control::band::BandConfig;
use crate::control::pid::PidConfig;
use crate::control::Tuning;
use crate::status::{Status, StatusBus};

/// Device identity
pub const DEVICE_TYPE: u16 = 0x0004;
pub const SW_VERSION: u8 = 1;
pub const FW_VERSION: u8 = 1;
pub const CF_VERSION: u32 = 1;

/// Number of sensitivity levels
pub const SENSITIVITY_LEVELS: usize = 10;

/// Dead band per sensitivity level (1/100 mm)
pub const DEAD_BANDS: [u16; SENSITIVITY_LEVELS] = [50, 40, 36, 34, 30, 24, 20, 16, 12, 10];

/// Proportional band per sensitivity level (1/100 mm)
pub const PROP_BANDS: [u16; SENSITIVITY_LEVELS] = [180, 160, 140, 120, 100, 80, 60, 50, 40, 30];

/// Wait before the first pulse after entering the proportional band
pub const SENSITIVITY_DELAY_MS: [u32; SENSITIVITY_LEVELS] =
    [500, 450, 400, 350, 300, 350, 300, 250, 200, 150];

/// Default work delay (seconds of readings held in the delay line)
pub const DEFAULT_WORK_DELAY_S: u8 = 1;

/// Longest work delay the delay line can hold
pub const MAX_WORK_DELAY_S: u8 = 10;

/// Default PID gains (value × 100) and sampling
pub const DEFAULT_KP_X100: i16 = 55;
pub const DEFAULT_KI_X100: i16 = 0;
pub const DEFAULT_KD_X100: i16 = 0;
pub const DEFAULT_SAMPLING_MS: u16 = 50;

/// Default PID output clamp (ms of valve time)
pub const DEFAULT_MAX_PID_TIME_MS: u16 = 1000;

/// Number of targets stored per mode (one per sensor node)
pub const TARGETS_PER_MODE: usize = 3;

/// Errors from settings encoding or validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Stored bytes are not a settings record
    Decode,
    /// Buffer too small for the encoded record
    Encode,
}

/// UI language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Language {
    #[default]
    English,
    Russian,
}

impl Language {
    pub fn code(self) -> u8 {
        match self {
            Language::English => 0,
            Language::Russian => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Language::English),
            1 => Some(Language::Russian),
            _ => None,
        }
    }
}

/// Which control policy drives the valves in auto mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PolicyKind {
    #[default]
    Pid,
    Band,
}

/// PID tuning for one sensor mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PidTuning {
    /// Proportional gain (value × 100)
    pub kp_x100: i16,
    /// Integral gain (value × 100)
    pub ki_x100: i16,
    /// Derivative gain (value × 100)
    pub kd_x100: i16,
    /// Sampling period
    pub sampling_ms: u16,
}

impl Default for PidTuning {
    fn default() -> Self {
        Self {
            kp_x100: DEFAULT_KP_X100,
            ki_x100: DEFAULT_KI_X100,
            kd_x100: DEFAULT_KD_X100,
            sampling_ms: DEFAULT_SAMPLING_MS,
        }
    }
}

/// Per-mode settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModeSettings {
    pub pid: PidTuning,
    /// Sensitivity level index (0..SENSITIVITY_LEVELS)
    pub sensitivity: u8,
    /// Seconds of readings held in the delay line
    pub work_delay_s: u8,
    /// Last saved targets (1/100 mm); single-sensor modes use slot 0
    pub targets: [i16; TARGETS_PER_MODE],
}

impl Default for ModeSettings {
    fn default() -> Self {
        Self {
            pid: PidTuning::default(),
            sensitivity: 0,
            work_delay_s: DEFAULT_WORK_DELAY_S,
            targets: [0; TARGETS_PER_MODE],
        }
    }
}

impl ModeSettings {
    fn is_valid(&self) -> bool {
        (self.sensitivity as usize) < SENSITIVITY_LEVELS
            && self.work_delay_s <= MAX_WORK_DELAY_S
            && self.pid.sampling_ms > 0
    }

    fn level(&self) -> usize {
        (self.sensitivity as usize).min(SENSITIVITY_LEVELS - 1)
    }

    pub fn dead_band(&self) -> u16 {
        DEAD_BANDS[self.level()]
    }

    pub fn prop_band(&self) -> u16 {
        PROP_BANDS[self.level()]
    }

    pub fn sensitivity_delay_ms(&self) -> u32 {
        SENSITIVITY_DELAY_MS[self.level()]
    }

    /// Band policy parameters for this mode
    pub fn band_config(&self) -> BandConfig {
        BandConfig {
            dead_band: self.dead_band(),
            prop_band: self.prop_band(),
            sensitivity_delay_ms: self.sensitivity_delay_ms(),
            ..BandConfig::default()
        }
    }

    /// PID parameters for this mode
    pub fn pid_config(&self, max_output_ms: u16) -> PidConfig {
        PidConfig {
            kp_x100: self.pid.kp_x100,
            ki_x100: self.pid.ki_x100,
            kd_x100: self.pid.kd_x100,
            sampling_ms: self.pid.sampling_ms,
            max_output_ms,
            ..PidConfig::default()
        }
    }
}

/// Complete persisted settings record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Settings {
    pub device_type: u16,
    pub sw_id: u8,
    pub fw_id: u8,
    pub cf_id: u32,
    /// Language code
    pub language: u8,
    /// Active sensor mode code
    pub sensor_mode: u8,
    pub policy: PolicyKind,
    /// PID output clamp (ms of valve time)
    pub max_pid_time_ms: u16,
    /// Indexed by `SensorMode::index`
    pub modes: [ModeSettings; 3],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_type: DEVICE_TYPE,
            sw_id: SW_VERSION,
            fw_id: FW_VERSION,
            cf_id: CF_VERSION,
            language: Language::English.code(),
            sensor_mode: SensorMode::Surface.code(),
            policy: PolicyKind::Pid,
            max_pid_time_ms: DEFAULT_MAX_PID_TIME_MS,
            modes: [ModeSettings::default(); 3],
        }
    }
}

impl Settings {
    /// Validate identity and every bounded field
    pub fn check(&self) -> bool {
        self.device_type == DEVICE_TYPE
            && self.sw_id == SW_VERSION
            && self.fw_id == FW_VERSION
            && Language::from_code(self.language).is_some()
            && SensorMode::from_code(self.sensor_mode).is_some()
            && self.max_pid_time_ms > 0
            && self.modes.iter().all(ModeSettings::is_valid)
    }

    /// Repair an invalid record and flag it for saving
    pub fn repair(&mut self, bus: &StatusBus) {
        warn!("Repairing settings");
        bus.set(Status::NeedSaveSettings);

        if self.fw_id != FW_VERSION {
            self.fw_id = FW_VERSION;
        }

        if !self.check() {
            warn!("Settings reset to defaults");
            *self = Self::default();
        }
    }

    /// Validate, repairing if needed
    pub fn validated(mut self, bus: &StatusBus) -> Self {
        if !self.check() {
            self.repair(bus);
        }
        self
    }

    /// Active sensor mode
    pub fn sensor_mode(&self) -> SensorMode {
        SensorMode::from_code(self.sensor_mode).unwrap_or_default()
    }

    pub fn language(&self) -> Language {
        Language::from_code(self.language).unwrap_or_default()
    }

    pub fn mode(&self, mode: SensorMode) -> &ModeSettings {
        &self.modes[mode.index()]
    }

    pub fn mode_mut(&mut self, mode: SensorMode) -> &mut ModeSettings {
        &mut self.modes[mode.index()]
    }

    /// Targets to program into the sensor unit for `mode`
    pub fn targets(&self, mode: SensorMode) -> [i16; TARGETS_PER_MODE] {
        let stored = self.mode(mode).targets;
        if mode.is_multi() {
            stored
        } else {
            [stored[0], 0, 0]
        }
    }

    /// Control tuning for `mode` under the configured policy
    pub fn tuning(&self, mode: SensorMode) -> Tuning {
        let mode_settings = self.mode(mode);
        match self.policy {
            PolicyKind::Pid => Tuning::Pid(mode_settings.pid_config(self.max_pid_time_ms)),
            PolicyKind::Band => Tuning::Band(mode_settings.band_config()),
        }
    }

    /// Work delay in seconds for `mode`
    pub fn work_delay_s(&self, mode: SensorMode) -> u8 {
        self.mode(mode).work_delay_s
    }
}
