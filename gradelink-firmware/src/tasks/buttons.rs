//! Button sampling task

use defmt::*;
use embassy_stm32::gpio::Input;
use embassy_time::{Duration, Ticker};

use gradelink_core::input::{ButtonPanel, DEBOUNCE_MS};
use gradelink_drivers::GpioButtons;

use super::now_ms;
use crate::channels::{CLICKS, STATUS};

#[embassy_executor::task]
pub async fn buttons_task(mut inputs: GpioButtons<Input<'static>>) {
    info!("Button task started");

    let mut panel = ButtonPanel::new();
    let mut ticker = Ticker::every(Duration::from_millis(DEBOUNCE_MS as u64));

    loop {
        ticker.next().await;
        let now = now_ms();
        CLICKS.lock(|queue| {
            panel.poll(now, &mut inputs, &mut queue.borrow_mut(), &STATUS);
        });
    }
}
