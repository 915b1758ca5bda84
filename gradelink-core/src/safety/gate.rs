//! Bounded startup gates
//!
//! A few peripherals need a short busy-wait at boot (external clock ready,
//! supply voltage settled). Each wait is bounded and reports whether it
//! succeeded; a timed-out gate raises its fault on the status bus.

use crate::status::{Fault, StatusBus};

/// Polls allowed for the external clock to become ready
pub const CLOCK_GATE_POLLS: u32 = 0x100;

/// Polls allowed for the supply voltage to settle
pub const POWER_GATE_POLLS: u32 = 0x1000;

/// Full-scale ADC reading
pub const ADC_MAX: u32 = 4095;

/// Internal reference voltage (V × 10)
pub const VREFINT_X10: u32 = 12;

/// Accepted supply range (V × 10)
pub const SUPPLY_MIN_X10: u16 = 27;
pub const SUPPLY_MAX_X10: u16 = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateOutcome {
    Ready,
    TimedOut,
}

/// Poll `ready` at most `max_polls` times
pub fn poll_until(max_polls: u32, mut ready: impl FnMut() -> bool) -> GateOutcome {
    for _ in 0..max_polls {
        if ready() {
            return GateOutcome::Ready;
        }
    }
    GateOutcome::TimedOut
}

/// Wait for the external clock; raises `Fault::Rcc` on timeout
pub fn clock_gate(bus: &StatusBus, ready: impl FnMut() -> bool) -> GateOutcome {
    let outcome = poll_until(CLOCK_GATE_POLLS, ready);
    if outcome == GateOutcome::TimedOut {
        error!("Clock not ready");
        bus.set_error(Fault::Rcc);
    }
    outcome
}

/// Supply voltage (V × 10) from a raw internal-reference reading
pub fn supply_x10(vrefint_raw: u16) -> u16 {
    if vrefint_raw == 0 {
        return 0;
    }
    (ADC_MAX * VREFINT_X10 / vrefint_raw as u32).min(u16::MAX as u32) as u16
}

/// Wait for the supply to enter its window; raises `Fault::Power` on timeout
///
/// `sample` returns the raw internal-reference reading.
pub fn power_gate(bus: &StatusBus, mut sample: impl FnMut() -> u16) -> GateOutcome {
    let outcome = poll_until(POWER_GATE_POLLS, || {
        (SUPPLY_MIN_X10..=SUPPLY_MAX_X10).contains(&supply_x10(sample()))
    });
    if outcome == GateOutcome::TimedOut {
        error!("Supply voltage out of range");
        bus.set_error(Fault::Power);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_until_ready() {
        let mut polls = 0;
        let outcome = poll_until(10, || {
            polls += 1;
            polls == 3
        });
        assert_eq!(outcome, GateOutcome::Ready);
        assert_eq!(polls, 3);
    }

    #[test]
    fn test_poll_until_bounded() {
        let mut polls = 0;
        let outcome = poll_until(CLOCK_GATE_POLLS, || {
            polls += 1;
            false
        });
        assert_eq!(outcome, GateOutcome::TimedOut);
        assert_eq!(polls, CLOCK_GATE_POLLS);
    }

    #[test]
    fn test_clock_gate_raises_fault() {
        let bus = StatusBus::new();
        assert_eq!(clock_gate(&bus, || true), GateOutcome::Ready);
        assert!(!bus.has_errors());

        assert_eq!(clock_gate(&bus, || false), GateOutcome::TimedOut);
        assert!(bus.is_error(Fault::Rcc));
    }

    #[test]
    fn test_supply_conversion() {
        assert_eq!(supply_x10(0), 0);
        // 1.2 V reference read at 3.3 V full scale
        assert_eq!(supply_x10(1489), 33);
        assert_eq!(supply_x10(4095), 12);
    }

    #[test]
    fn test_power_gate() {
        let bus = StatusBus::new();
        let mut readings = [0u16, 4095, 1489].into_iter();
        let outcome = power_gate(&bus, || readings.next().unwrap_or(0));
        assert_eq!(outcome, GateOutcome::Ready);
        assert!(!bus.has_errors());

        assert_eq!(power_gate(&bus, || 4095), GateOutcome::TimedOut);
        assert!(bus.is_error(Fault::Power));
    }
}
