//! CAN frame type and value codec for the sensor link.
//!
//! Frame format (classic CAN, standard identifier):
//! - ID (11 bits): message identifier
//! - DLC (0-8): number of data bytes
//! - DATA (0-8 bytes): message-specific payload
//!
//! Signed values are carried as 16-bit big-endian two's complement.

use heapless::Vec;

/// Maximum data length of a classic CAN frame
pub const MAX_DATA_LEN: usize = 8;

/// Largest standard (11-bit) identifier
pub const MAX_STANDARD_ID: u16 = 0x7FF;

/// Errors that can occur during frame construction or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Identifier does not fit in 11 bits
    InvalidId,
    /// Data exceeds 8 bytes
    PayloadTooLarge,
    /// Frame is shorter than the message requires
    TooShort,
}

/// A received or constructed CAN frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanFrame {
    /// Standard identifier
    pub id: u16,
    /// Data bytes
    pub data: Vec<u8, MAX_DATA_LEN>,
}

impl CanFrame {
    /// Create a new frame with the given identifier and data
    pub fn new(id: u16, data: &[u8]) -> Result<Self, FrameError> {
        if id > MAX_STANDARD_ID {
            return Err(FrameError::InvalidId);
        }

        let mut data_vec = Vec::new();
        data_vec
            .extend_from_slice(data)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self { id, data: data_vec })
    }

    /// Create a frame with no data
    pub fn empty(id: u16) -> Self {
        Self {
            id: id & MAX_STANDARD_ID,
            data: Vec::new(),
        }
    }

    /// Create a frame from known-good parts, dropping data past the 8th byte
    pub fn truncating(id: u16, data: &[u8]) -> Self {
        let len = data.len().min(MAX_DATA_LEN);
        let mut frame = Self::empty(id);
        // Cannot fail: len <= capacity
        let _ = frame.data.extend_from_slice(&data[..len]);
        frame
    }

    /// Data length code
    pub fn dlc(&self) -> usize {
        self.data.len()
    }

    /// Read a big-endian i16 starting at `offset`
    pub fn read_i16(&self, offset: usize) -> Result<i16, FrameError> {
        match self.data.get(offset..offset + 2) {
            Some(&[hi, lo]) => Ok(decode_i16(hi, lo)),
            _ => Err(FrameError::TooShort),
        }
    }

    /// True if the first `expected.len()` data bytes equal `expected`
    pub fn starts_with(&self, expected: &[u8]) -> bool {
        self.data.starts_with(expected)
    }
}

/// Encode a signed value as big-endian bytes
pub fn encode_i16(value: i16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Decode a big-endian two's complement value
pub fn decode_i16(hi: u8, lo: u8) -> i16 {
    i16::from_be_bytes([hi, lo])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_frame_new() {
        let frame = CanFrame::new(0x07EC, &[0x01, 0x0F, 0x00]).unwrap();
        assert_eq!(frame.id, 0x07EC);
        assert_eq!(frame.dlc(), 3);
    }

    #[test]
    fn test_frame_rejects_long_payload() {
        let result = CanFrame::new(0x0028, &[0u8; 9]);
        assert_eq!(result, Err(FrameError::PayloadTooLarge));
    }

    #[test]
    fn test_frame_rejects_extended_id() {
        let result = CanFrame::new(0x800, &[]);
        assert_eq!(result, Err(FrameError::InvalidId));
    }

    #[test]
    fn test_read_i16() {
        let frame = CanFrame::new(0x02A7, &[0x02, 0xFF, 0x38]).unwrap();
        assert_eq!(frame.read_i16(1), Ok(-200));
        assert_eq!(frame.read_i16(2), Err(FrameError::TooShort));
    }

    #[test]
    fn test_decode_known_values() {
        assert_eq!(decode_i16(0x00, 0x00), 0);
        assert_eq!(decode_i16(0x7F, 0xFF), i16::MAX);
        assert_eq!(decode_i16(0x80, 0x00), i16::MIN);
        assert_eq!(decode_i16(0xFF, 0xFF), -1);
        assert_eq!(encode_i16(-300), [0xFE, 0xD4]);
    }

    #[test]
    fn test_starts_with() {
        let frame = CanFrame::new(0x07ED, &[0x01, 0x0F, 0x00, 0x00, 0x19, 0x00, 0xAA]).unwrap();
        assert!(frame.starts_with(&[0x01, 0x0F, 0x00, 0x00, 0x19, 0x00]));
        assert!(!frame.starts_with(&[0x01, 0x0F, 0x00, 0x00, 0x05, 0x00]));
    }

    proptest! {
        #[test]
        fn prop_i16_roundtrip(value in any::<i16>()) {
            let [hi, lo] = encode_i16(value);
            prop_assert_eq!(decode_i16(hi, lo), value);
        }

        #[test]
        fn prop_frame_read_matches_encode(value in any::<i16>(), tag in any::<u8>()) {
            let [hi, lo] = encode_i16(value);
            let frame = CanFrame::new(0x02A8, &[tag, hi, lo]).unwrap();
            prop_assert_eq!(frame.read_i16(1), Ok(value));
        }
    }
}
