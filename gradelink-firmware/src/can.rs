//! bxCAN glue
//!
//! Converts between embassy-stm32 frames and protocol frames, and adapts
//! the transmit half to the link engine's non-blocking sink.

use embassy_stm32::can::{CanTx, Frame, TryWriteError};
use embedded_can::Id;

use gradelink_core::traits::{BusError, FrameSink};
use gradelink_protocol::CanFrame;

/// Bus bitrate of the sensor unit
pub const CAN_BITRATE: u32 = 250_000;

/// Protocol frame from a received frame; extended ids are not used
pub fn to_protocol_frame(frame: &Frame) -> Option<CanFrame> {
    match frame.id() {
        Id::Standard(id) => CanFrame::new(id.as_raw(), frame.data()).ok(),
        Id::Extended(_) => None,
    }
}

/// Link engine sink over the transmit mailboxes
pub struct CanSink {
    tx: CanTx<'static>,
}

impl CanSink {
    pub fn new(tx: CanTx<'static>) -> Self {
        Self { tx }
    }
}

impl FrameSink for CanSink {
    fn try_transmit(&mut self, frame: &CanFrame) -> Result<(), BusError> {
        let frame = Frame::new_standard(frame.id, &frame.data).map_err(|_| BusError::Fault)?;
        match self.tx.try_write(&frame) {
            // A lower-priority frame may have been displaced; the link retries on timeout
            Ok(_) => Ok(()),
            Err(TryWriteError::Full) => Err(BusError::Busy),
        }
    }
}
