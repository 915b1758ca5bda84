//! Boot gates and fatal-fault escalation

pub mod fault;
pub mod gate;

pub use fault::{boot_fault, clear_after_boot, restore_last_error, FaultLatch};
pub use gate::{clock_gate, poll_until, power_gate, GateOutcome};
