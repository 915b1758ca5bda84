//! Status/error bus
//!
//! Process-wide flags used for signaling between the CAN receive path, the
//! link engine, the controller and the UI without coupling them directly.
//! Each flag is a bit in an atomic word, so any context (task or interrupt)
//! can set, clear or test flags through a shared reference.

use portable_atomic::{AtomicU16, AtomicU32, Ordering};

/// Non-fatal conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    /// Boot not finished; actuation held off
    WaitLoad = 0,
    /// None of the channels the requested mode needs is reporting
    NoSensor,
    /// Multi-sensor mode with only some of the three channels reporting
    NoBigSki,
    /// Bus error reported by the CAN peripheral
    CanFault,
    ManualNeedValveUp,
    ManualNeedValveDown,
    AutoNeedValveUp,
    AutoNeedValveDown,
    /// Settings changed and should be written to flash
    NeedSaveSettings,
}

impl Status {
    fn mask(self) -> u32 {
        1 << (self as u8)
    }
}

/// Fatal conditions; any of these halts actuation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Fault {
    /// Clock source never became ready
    Rcc = 1,
    Memory,
    /// Supply voltage out of range
    Power,
    Stack,
    Load,
    Ram,
    /// Persisted settings could not be loaded or repaired
    SettingsLoad,
    AppMode,
    Valve,
    Assert,
    /// Fault handler entered
    ErrorHandler,
    Internal,
}

impl Fault {
    pub const ALL: [Fault; 12] = [
        Fault::Rcc,
        Fault::Memory,
        Fault::Power,
        Fault::Stack,
        Fault::Load,
        Fault::Ram,
        Fault::SettingsLoad,
        Fault::AppMode,
        Fault::Valve,
        Fault::Assert,
        Fault::ErrorHandler,
        Fault::Internal,
    ];

    /// Code persisted across a reset (never 0)
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|fault| fault.code() == code)
    }

    /// Faults that survive a reset and are raised again on the next boot
    pub fn is_sticky(self) -> bool {
        matches!(self, Fault::Memory | Fault::Stack | Fault::SettingsLoad)
    }

    fn mask(self) -> u32 {
        1 << (self as u8)
    }
}

/// Shared status and error flags
#[derive(Debug, Default)]
pub struct StatusBus {
    statuses: AtomicU32,
    errors: AtomicU32,
    last_error: AtomicU16,
}

impl StatusBus {
    pub const fn new() -> Self {
        Self {
            statuses: AtomicU32::new(0),
            errors: AtomicU32::new(0),
            last_error: AtomicU16::new(0),
        }
    }

    pub fn set(&self, status: Status) {
        self.statuses.fetch_or(status.mask(), Ordering::AcqRel);
    }

    pub fn reset(&self, status: Status) {
        self.statuses.fetch_and(!status.mask(), Ordering::AcqRel);
    }

    /// Set or clear a status from a condition
    pub fn assign(&self, status: Status, active: bool) {
        if active {
            self.set(status);
        } else {
            self.reset(status);
        }
    }

    pub fn is(&self, status: Status) -> bool {
        self.statuses.load(Ordering::Acquire) & status.mask() != 0
    }

    /// Raise a fatal error and remember it as the last error
    pub fn set_error(&self, fault: Fault) {
        self.errors.fetch_or(fault.mask(), Ordering::AcqRel);
        self.last_error.store(fault.code(), Ordering::Release);
    }

    pub fn reset_error(&self, fault: Fault) {
        self.errors.fetch_and(!fault.mask(), Ordering::AcqRel);
    }

    pub fn is_error(&self, fault: Fault) -> bool {
        self.errors.load(Ordering::Acquire) & fault.mask() != 0
    }

    pub fn has_errors(&self) -> bool {
        self.errors.load(Ordering::Acquire) != 0
    }

    /// Lowest-coded active error
    pub fn first_error(&self) -> Option<Fault> {
        let errors = self.errors.load(Ordering::Acquire);
        Fault::ALL.into_iter().find(|fault| errors & fault.mask() != 0)
    }

    /// Last error raised in this boot, or restored from the previous one
    pub fn last_error(&self) -> Option<Fault> {
        Fault::from_code(self.last_error.load(Ordering::Acquire))
    }

    pub fn set_last_error(&self, fault: Option<Fault>) {
        let code = fault.map(Fault::code).unwrap_or(0);
        self.last_error.store(code, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_set_reset() {
        let bus = StatusBus::new();
        assert!(!bus.is(Status::NoSensor));

        bus.set(Status::NoSensor);
        bus.set(Status::CanFault);
        assert!(bus.is(Status::NoSensor));
        assert!(bus.is(Status::CanFault));

        bus.reset(Status::NoSensor);
        assert!(!bus.is(Status::NoSensor));
        assert!(bus.is(Status::CanFault));
    }

    #[test]
    fn test_statuses_are_not_errors() {
        let bus = StatusBus::new();
        bus.set(Status::WaitLoad);
        assert!(!bus.has_errors());
        assert_eq!(bus.first_error(), None);
    }

    #[test]
    fn test_first_error_is_lowest() {
        let bus = StatusBus::new();
        bus.set_error(Fault::Internal);
        bus.set_error(Fault::Power);
        assert!(bus.has_errors());
        assert_eq!(bus.first_error(), Some(Fault::Power));
        assert_eq!(bus.last_error(), Some(Fault::Power));

        bus.reset_error(Fault::Power);
        assert_eq!(bus.first_error(), Some(Fault::Internal));
        // Last error is a record, not a live flag
        assert_eq!(bus.last_error(), Some(Fault::Power));
    }

    #[test]
    fn test_fault_codes() {
        for fault in Fault::ALL {
            assert_ne!(fault.code(), 0);
            assert_eq!(Fault::from_code(fault.code()), Some(fault));
        }
        assert_eq!(Fault::from_code(0), None);
        assert_eq!(Fault::from_code(0xFFFF), None);
    }

    #[test]
    fn test_sticky_faults() {
        assert!(Fault::Memory.is_sticky());
        assert!(Fault::Stack.is_sticky());
        assert!(Fault::SettingsLoad.is_sticky());
        assert!(!Fault::Power.is_sticky());
        assert!(!Fault::Rcc.is_sticky());
    }
}
