//! Gradelink - Valve Actuator Firmware
//!
//! Main firmware binary for STM32F103-based valve controllers. Drives a
//! hydraulic plate through a raise/lower valve pair, holding it at a target
//! measured by a remote distance sensor unit on CAN.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_futures::block_on;
use embassy_stm32::adc::{Adc, SampleTime};
use embassy_stm32::can::filter::Mask32;
use embassy_stm32::can::{
    Can, Fifo, Rx0InterruptHandler, Rx1InterruptHandler, SceInterruptHandler, TxInterruptHandler,
};
use embassy_stm32::flash::Flash;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::peripherals::CAN;
use embassy_stm32::time::Hertz;
use embassy_stm32::{bind_interrupts, pac, Config};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use gradelink_core::app::Application;
use gradelink_core::config::persist;
use gradelink_core::safety::{boot_fault, clear_after_boot, clock_gate, power_gate, restore_last_error};
use gradelink_core::status::{Fault, Status};
use gradelink_core::traits::BackupRegister;
use gradelink_drivers::{GpioButtons, GpioValvePair};

use crate::backup::BackupDomain;
use crate::can::{CanSink, CAN_BITRATE};
use crate::channels::{FAULT_LATCH, STATUS};
use crate::storage::FlashSettingsStore;

mod backup;
mod can;
mod channels;
mod storage;
mod tasks;
mod ui;

bind_interrupts!(struct Irqs {
    USB_LP_CAN1_RX0 => Rx0InterruptHandler<CAN>;
    CAN1_RX1 => Rx1InterruptHandler<CAN>;
    CAN1_SCE => SceInterruptHandler<CAN>;
    USB_HP_CAN1_TX => TxInterruptHandler<CAN>;
});

/// Valve pins on GPIOB (active-high drivers)
const VALVE_DOWN_PIN: usize = 12;
const VALVE_UP_PIN: usize = 13;

// Must live forever for the split halves
static CAN_BUS: StaticCell<Can<'static>> = StaticCell::new();

/// 8 MHz crystal, 72 MHz system clock
fn clock_config() -> Config {
    use embassy_stm32::rcc::*;

    let mut config = Config::default();
    config.rcc.hse = Some(Hse {
        freq: Hertz(8_000_000),
        mode: HseMode::Oscillator,
    });
    config.rcc.pll = Some(Pll {
        src: PllSource::HSE,
        prediv: PllPreDiv::DIV1,
        mul: PllMul::MUL9,
    });
    config.rcc.sys = Sysclk::PLL1_P;
    config.rcc.ahb_pre = AHBPrescaler::DIV1;
    config.rcc.apb1_pre = APBPrescaler::DIV2;
    config.rcc.apb2_pre = APBPrescaler::DIV1;
    config
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Gradelink firmware starting...");

    let p = embassy_stm32::init(clock_config());
    STATUS.set(Status::WaitLoad);

    // Valves are released before anything else can fail
    let valves = GpioValvePair::new_active_high(
        Output::new(p.PB13, Level::Low, Speed::Low),
        Output::new(p.PB12, Level::Low, Speed::Low),
    );

    let mut backup = BackupDomain::new();
    restore_last_error(&mut backup, &STATUS);
    // No stack or heap guard runs on this board; those faults stay in last_error only
    STATUS.reset_error(Fault::Stack);
    STATUS.reset_error(Fault::Memory);

    clock_gate(&STATUS, || pac::RCC.cr().read().hserdy());

    let mut store = FlashSettingsStore::new(Flash::new_blocking(p.FLASH));
    let (settings, loaded) = persist::load(&mut store, &STATUS).await;
    match loaded {
        Ok(()) => STATUS.reset_error(Fault::SettingsLoad),
        Err(e) => {
            error!("Settings storage unusable: {:?}", e);
            STATUS.set_error(Fault::SettingsLoad);
        }
    }
    info!("Sensor mode {:?}", settings.sensor_mode());

    let mut adc = Adc::new(p.ADC1);
    adc.set_sample_time(SampleTime::CYCLES239_5);
    let mut vref = adc.enable_vref();
    power_gate(&STATUS, || block_on(adc.read(&mut vref)));

    let mut app = Application::new(settings, valves);

    if let Some(fault) = boot_fault(&STATUS) {
        if FAULT_LATCH
            .escalate(Some(fault), &STATUS, &mut backup, app.controller_mut())
            .is_some()
        {
            cortex_m::peripheral::SCB::sys_reset();
        }
    }
    clear_after_boot(&mut backup, &STATUS);

    // Front panel: Up PC9, Mode PC10, Down PC11, Enter PC12, F1-F3 on PB9/PB14/PB15
    let buttons = GpioButtons::new_active_low([
        Input::new(p.PC9, Pull::Up),
        Input::new(p.PC11, Pull::Up),
        Input::new(p.PC10, Pull::Up),
        Input::new(p.PC12, Pull::Up),
        Input::new(p.PB9, Pull::Up),
        Input::new(p.PB14, Pull::Up),
        Input::new(p.PB15, Pull::Up),
    ]);

    // CAN on PA11 (RX) / PA12 (TX)
    let can = CAN_BUS.init(Can::new(p.CAN, p.PA11, p.PA12, Irqs));
    can.modify_filters()
        .enable_bank(0, Fifo::Fifo0, Mask32::accept_all());
    can.modify_config()
        .set_loopback(false)
        .set_silent(false)
        .set_bitrate(CAN_BITRATE);
    can.enable().await;
    let (tx, rx) = can.split();
    info!("CAN enabled at {} bit/s", CAN_BITRATE);

    spawner.spawn(tasks::can_rx_task(rx)).unwrap();
    spawner.spawn(tasks::buttons_task(buttons)).unwrap();
    spawner.spawn(tasks::settings_task(store)).unwrap();
    spawner
        .spawn(tasks::control_task(app, CanSink::new(tx)))
        .unwrap();

    info!("All tasks spawned");
}

/// Record the fault, drop both valves and reset
#[cortex_m_rt::exception]
unsafe fn HardFault(_frame: &cortex_m_rt::ExceptionFrame) -> ! {
    pac::GPIOB.bsrr().write(|w| {
        w.set_br(VALVE_DOWN_PIN, true);
        w.set_br(VALVE_UP_PIN, true);
    });
    let mut backup = BackupDomain::new();
    if backup.read() == 0 {
        backup.write(Fault::ErrorHandler.code());
    }
    cortex_m::peripheral::SCB::sys_reset()
}
