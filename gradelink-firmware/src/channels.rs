//! Inter-task shared state
//!
//! The CAN receive task is the only writer of `SENSORS`; the control task
//! only reads it. Button events cross from the sampling task to the control
//! task through a critical-section guarded queue.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use gradelink_core::config::Settings;
use gradelink_core::input::ClickQueue;
use gradelink_core::link::SensorBank;
use gradelink_core::safety::FaultLatch;
use gradelink_core::status::StatusBus;

/// Status and error flags shared by every task
pub static STATUS: StatusBus = StatusBus::new();

/// Per-node distance channels and the handshake response mailbox
pub static SENSORS: SensorBank = SensorBank::new();

/// Debounced button events waiting for the UI
pub static CLICKS: Mutex<CriticalSectionRawMutex, RefCell<ClickQueue>> =
    Mutex::new(RefCell::new(ClickQueue::new()));

/// Settings record to write to flash (latest wins)
pub static SAVE_REQUEST: Signal<CriticalSectionRawMutex, Settings> = Signal::new();

/// Fatal path, taken at most once per boot
pub static FAULT_LATCH: FaultLatch = FaultLatch::new();
