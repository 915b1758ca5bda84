//! Backup domain data register
//!
//! BKP_DR1 survives a system reset as long as VBAT is present. It carries
//! the last fatal fault code into the next boot.

use embassy_stm32::pac;

use gradelink_core::traits::BackupRegister;

/// Index of BKP_DR1
const FAULT_REGISTER: usize = 0;

pub struct BackupDomain {
    _private: (),
}

impl BackupDomain {
    /// Enable the power and backup interface clocks
    pub fn new() -> Self {
        pac::RCC.apb1enr().modify(|w| {
            w.set_pwren(true);
            w.set_bkpen(true);
        });
        Self { _private: () }
    }
}

impl BackupRegister for BackupDomain {
    fn read(&mut self) -> u16 {
        pac::BKP.dr(FAULT_REGISTER).read().d()
    }

    fn write(&mut self, value: u16) {
        // Backup domain is write-protected outside this window
        pac::PWR.cr().modify(|w| w.set_dbp(true));
        pac::BKP.dr(FAULT_REGISTER).write(|w| w.set_d(value));
        pac::PWR.cr().modify(|w| w.set_dbp(false));
    }
}
