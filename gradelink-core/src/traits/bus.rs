//! CAN transmit trait

use gradelink_protocol::CanFrame;

/// Errors from queuing a frame for transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// All transmit mailboxes are full; try again later
    Busy,
    /// Controller is bus-off or in error passive
    Fault,
}

/// Non-blocking frame transmitter
///
/// Implementations queue the frame in a hardware mailbox and return
/// immediately. The link engine never waits on the bus.
pub trait FrameSink {
    fn try_transmit(&mut self, frame: &CanFrame) -> Result<(), BusError>;
}
