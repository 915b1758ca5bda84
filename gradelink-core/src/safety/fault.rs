//! Fatal-fault handling
//!
//! The last fatal fault is written to a battery-backed register before the
//! firmware resets, so the next boot can report it. Some faults are sticky
//! and are raised again on boot until the cause is addressed.

use portable_atomic::{AtomicBool, Ordering};

use crate::control::ActuatorController;
use crate::status::{Fault, Status, StatusBus};
use crate::traits::{BackupRegister, ValveOutputs};

/// Read the fault left by the previous boot and re-raise it if sticky
pub fn restore_last_error<B: BackupRegister>(backup: &mut B, bus: &StatusBus) -> Option<Fault> {
    let fault = Fault::from_code(backup.read());
    bus.set_last_error(fault);

    if let Some(fault) = fault {
        warn!("Previous boot ended with {:?}", fault);
        if fault.is_sticky() {
            bus.set_error(fault);
        }
    }
    fault
}

/// Fault to escalate once the boot gates have run, if any
///
/// A bare internal error at this point means loading failed.
pub fn boot_fault(bus: &StatusBus) -> Option<Fault> {
    match bus.first_error()? {
        Fault::Internal => Some(Fault::Load),
        fault => Some(fault),
    }
}

/// Boot finished cleanly: forget the stored fault and allow actuation
pub fn clear_after_boot<B: BackupRegister>(backup: &mut B, bus: &StatusBus) {
    backup.clear();
    bus.reset(Status::WaitLoad);
    info!("Boot complete");
}

/// Once-only fatal path
#[derive(Debug, Default)]
pub struct FaultLatch {
    tripped: AtomicBool,
}

impl FaultLatch {
    pub const fn new() -> Self {
        Self {
            tripped: AtomicBool::new(false),
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Halt actuation and record `fault` for the next boot
    ///
    /// With no fault given, the first active error is recorded, or
    /// `Fault::Internal` if there is none. Returns the recorded fault so the
    /// caller can reset, or `None` if the latch had already tripped.
    pub fn escalate<B: BackupRegister, V: ValveOutputs>(
        &self,
        fault: Option<Fault>,
        bus: &StatusBus,
        backup: &mut B,
        controller: &mut ActuatorController<V>,
    ) -> Option<Fault> {
        if self.tripped.swap(true, Ordering::AcqRel) {
            return None;
        }

        let recorded = fault
            .or_else(|| bus.first_error())
            .unwrap_or(Fault::Internal);
        bus.set_error(recorded);

        controller.force_off(bus);
        backup.write(recorded.code());
        error!("Fatal {:?}, resetting", recorded);
        Some(recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::control::Tuning;

    #[derive(Default)]
    struct MockBackup {
        value: u16,
    }

    impl BackupRegister for MockBackup {
        fn read(&mut self) -> u16 {
            self.value
        }

        fn write(&mut self, value: u16) {
            self.value = value;
        }
    }

    #[derive(Default)]
    struct MockValves {
        up: bool,
        down: bool,
    }

    impl ValveOutputs for MockValves {
        fn set_up(&mut self, energized: bool) {
            self.up = energized;
        }

        fn set_down(&mut self, energized: bool) {
            self.down = energized;
        }
    }

    #[test]
    fn test_restore_sticky_fault() {
        let bus = StatusBus::new();
        let mut backup = MockBackup {
            value: Fault::Stack.code(),
        };
        assert_eq!(restore_last_error(&mut backup, &bus), Some(Fault::Stack));
        assert!(bus.is_error(Fault::Stack));
        assert_eq!(bus.last_error(), Some(Fault::Stack));
    }

    #[test]
    fn test_restore_non_sticky_fault() {
        let bus = StatusBus::new();
        let mut backup = MockBackup {
            value: Fault::Power.code(),
        };
        assert_eq!(restore_last_error(&mut backup, &bus), Some(Fault::Power));
        assert!(!bus.has_errors());
        assert_eq!(bus.last_error(), Some(Fault::Power));
    }

    #[test]
    fn test_restore_nothing_stored() {
        let bus = StatusBus::new();
        let mut backup = MockBackup::default();
        assert_eq!(restore_last_error(&mut backup, &bus), None);
        assert_eq!(bus.last_error(), None);
    }

    #[test]
    fn test_boot_fault_maps_internal_to_load() {
        let bus = StatusBus::new();
        assert_eq!(boot_fault(&bus), None);
        bus.set_error(Fault::Internal);
        assert_eq!(boot_fault(&bus), Some(Fault::Load));
        bus.set_error(Fault::Power);
        assert_eq!(boot_fault(&bus), Some(Fault::Power));
    }

    #[test]
    fn test_clear_after_boot() {
        let bus = StatusBus::new();
        bus.set(Status::WaitLoad);
        let mut backup = MockBackup { value: 7 };
        clear_after_boot(&mut backup, &bus);
        assert_eq!(backup.value, 0);
        assert!(!bus.is(Status::WaitLoad));
    }

    #[test]
    fn test_escalate_once() {
        let bus = StatusBus::new();
        let settings = Settings::default();
        let mut backup = MockBackup::default();
        let mut controller = ActuatorController::new(MockValves::default(), Tuning::default());
        controller.tick(0, None, &settings, &bus);
        bus.set(Status::ManualNeedValveUp);
        controller.tick(10, None, &settings, &bus);
        assert!(controller.valves().up);
        bus.set(Status::AutoNeedValveUp);

        let latch = FaultLatch::new();
        let recorded = latch.escalate(Some(Fault::Valve), &bus, &mut backup, &mut controller);

        assert_eq!(recorded, Some(Fault::Valve));
        assert_eq!(backup.value, Fault::Valve.code());
        assert!(bus.is_error(Fault::Valve));
        assert!(!controller.valves().up && !controller.valves().down);
        assert!(!bus.is(Status::AutoNeedValveUp));
        assert!(latch.is_tripped());

        assert_eq!(
            latch.escalate(Some(Fault::Power), &bus, &mut backup, &mut controller),
            None
        );
        assert_eq!(backup.value, Fault::Valve.code());
    }

    #[test]
    fn test_escalate_without_fault() {
        let bus = StatusBus::new();
        let mut backup = MockBackup::default();
        let mut controller = ActuatorController::new(MockValves::default(), Tuning::default());

        let latch = FaultLatch::new();
        assert_eq!(
            latch.escalate(None, &bus, &mut backup, &mut controller),
            Some(Fault::Internal)
        );
        assert_eq!(backup.value, Fault::Internal.code());

        let bus = StatusBus::new();
        bus.set_error(Fault::Memory);
        let latch = FaultLatch::new();
        assert_eq!(
            latch.escalate(None, &bus, &mut backup, &mut controller),
            Some(Fault::Memory)
        );
    }
}
