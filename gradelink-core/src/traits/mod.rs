//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod backup;
pub mod bus;
pub mod input;
pub mod store;
pub mod valve;

pub use backup::BackupRegister;
pub use bus::{BusError, FrameSink};
pub use input::{Button, ButtonInputs};
pub use store::{SettingsStore, StoreError};
pub use valve::ValveOutputs;
