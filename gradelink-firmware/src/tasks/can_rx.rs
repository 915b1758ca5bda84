//! CAN receive task
//!
//! Sole writer of the sensor channels and the handshake response mailbox.

use defmt::*;
use embassy_stm32::can::CanRx;

use gradelink_core::status::Status;

use super::now_ms;
use crate::can::to_protocol_frame;
use crate::channels::{SENSORS, STATUS};

#[embassy_executor::task]
pub async fn can_rx_task(mut rx: CanRx<'static>) {
    info!("CAN receive task started");

    loop {
        match rx.read().await {
            Ok(envelope) => {
                if let Some(frame) = to_protocol_frame(&envelope.frame) {
                    SENSORS.ingest(&frame, now_ms(), &STATUS);
                }
            }
            Err(e) => {
                if !STATUS.is(Status::CanFault) {
                    warn!("CAN bus error: {}", Debug2Format(&e));
                }
                STATUS.set(Status::CanFault);
            }
        }
    }
}
