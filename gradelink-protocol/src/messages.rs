//! Message types for the sensor link
//!
//! Messages are divided into three groups:
//! - Controller → Sensor: bring-up sequence, handshake requests, feedback pair
//! - Sensor → Controller: handshake acks
//! - Sensor → Controller (unsolicited): distance reports

use crate::direction::Direction;
use crate::frame::{encode_i16, CanFrame};
use crate::mode::{SensorMode, SensorNode};

// Identifiers: Controller → Sensor
pub const ID_BRING_UP: u16 = 0x0050;
pub const ID_FEEDBACK_VALUE: u16 = 0x0028;
pub const ID_FEEDBACK_TRAILER: u16 = 0x03F0;
pub const ID_HANDSHAKE_REQUEST: u16 = 0x07EC;

// Identifiers: Sensor → Controller
pub const ID_HANDSHAKE_ACK: u16 = 0x07ED;

/// First data byte of a distance report
pub const DISTANCE_REPORT_TAG: u8 = 0x02;

/// Handshake header shared by every request and ack
const HANDSHAKE_HEADER: [u8; 2] = [0x01, 0x0F];

// Handshake commands
pub const CMD_SELECT_MODE: u8 = 0x19;
pub const CMD_SET_TARGET: u8 = 0x05;
pub const CMD_FINALIZE: u8 = 0x03;
pub const CMD_FINALIZE_MULTI: u8 = 0x12;

/// Length of a handshake ack that is compared against the expected bytes
pub const ACK_LEN: usize = 6;

/// Frame whose content is fixed at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticFrame {
    pub id: u16,
    pub data: &'static [u8],
}

impl StaticFrame {
    pub fn to_frame(&self) -> CanFrame {
        CanFrame::truncating(self.id, self.data)
    }
}

/// Link bring-up sequence, sent one frame per step
pub const BRING_UP_SEQUENCE: [StaticFrame; 4] = [
    StaticFrame {
        id: ID_BRING_UP,
        data: &[0x01, 0x00],
    },
    StaticFrame {
        id: ID_FEEDBACK_VALUE,
        data: &[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0F, 0xFF],
    },
    StaticFrame {
        id: ID_BRING_UP,
        data: &[0x01, 0x2A],
    },
    StaticFrame {
        id: ID_FEEDBACK_VALUE,
        data: &[0x00; 8],
    },
];

/// Trailer bytes after the value in feedback frame A
const FEEDBACK_VALUE_TRAILER: [u8; 6] = [0x00, 0x00, 0x00, 0x00, 0x0F, 0xFF];

/// Feedback frame B
const FEEDBACK_TRAILER: StaticFrame = StaticFrame {
    id: ID_FEEDBACK_TRAILER,
    data: &[0x2F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
};

/// Feedback frame A carrying the controller's current value
pub fn feedback_value(value: i16) -> CanFrame {
    let [hi, lo] = encode_i16(value);
    let mut data = [0u8; 8];
    data[0] = hi;
    data[1] = lo;
    data[2..].copy_from_slice(&FEEDBACK_VALUE_TRAILER);
    CanFrame::truncating(ID_FEEDBACK_VALUE, &data)
}

/// Feedback frame B, sent after frame A
pub fn feedback_trailer() -> CanFrame {
    FEEDBACK_TRAILER.to_frame()
}

/// One step of the mode-change handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkRequest {
    /// Switch the sensor unit to a measuring mode
    SelectMode(SensorMode),
    /// Program the target of one node; the wire carries the negated target
    SetTarget { node: u8, target: i16 },
    /// Finish a single-sensor handshake
    Finalize,
    /// Finish a multi-sensor handshake
    FinalizeMulti,
}

impl LinkRequest {
    /// Command byte of this step
    pub fn command(&self) -> u8 {
        match self {
            LinkRequest::SelectMode(_) => CMD_SELECT_MODE,
            LinkRequest::SetTarget { .. } => CMD_SET_TARGET,
            LinkRequest::Finalize => CMD_FINALIZE,
            LinkRequest::FinalizeMulti => CMD_FINALIZE_MULTI,
        }
    }

    fn node(&self) -> u8 {
        match self {
            LinkRequest::SetTarget { node, .. } => *node,
            _ => 0,
        }
    }

    /// Encode the request frame
    pub fn to_frame(&self) -> CanFrame {
        let [h0, h1] = HANDSHAKE_HEADER;
        match *self {
            LinkRequest::SelectMode(mode) => CanFrame::truncating(
                ID_HANDSHAKE_REQUEST,
                &[h0, h1, 0x00, CMD_SELECT_MODE, mode.handshake_code()],
            ),
            LinkRequest::SetTarget { node, target } => {
                // Payload: [01][0F][node][05][offset_hi][offset_lo]
                let [hi, lo] = encode_i16(target.saturating_neg());
                CanFrame::truncating(ID_HANDSHAKE_REQUEST, &[h0, h1, node, CMD_SET_TARGET, hi, lo])
            }
            LinkRequest::Finalize => {
                CanFrame::truncating(ID_HANDSHAKE_REQUEST, &[h0, h1, 0x00, CMD_FINALIZE, 0x06])
            }
            LinkRequest::FinalizeMulti => CanFrame::truncating(
                ID_HANDSHAKE_REQUEST,
                &[h0, h1, 0x00, CMD_FINALIZE_MULTI, 0x00],
            ),
        }
    }

    /// The ack the sensor unit answers this step with
    pub fn expected_ack(&self) -> [u8; ACK_LEN] {
        let [h0, h1] = HANDSHAKE_HEADER;
        [h0, h1, self.node(), 0x00, self.command(), 0x00]
    }

    /// True if `frame` is the ack for this step
    pub fn is_acked_by(&self, frame: &CanFrame) -> bool {
        frame.id == ID_HANDSHAKE_ACK && frame.starts_with(&self.expected_ack())
    }
}

/// Decoded distance report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DistanceReport {
    pub node: SensorNode,
    /// Distance in 1/100 mm, relative to the programmed target
    pub distance: i16,
    /// Lateral position; only the primary node reports one
    pub direction: Option<Direction>,
}

impl DistanceReport {
    /// Decode a distance report, or `None` if the frame is not one
    pub fn from_frame(frame: &CanFrame) -> Option<Self> {
        let node = SensorNode::from_id(frame.id)?;
        if frame.data.first() != Some(&DISTANCE_REPORT_TAG) {
            return None;
        }
        let distance = frame.read_i16(1).ok()?;
        let direction = match node {
            SensorNode::Primary => frame.data.get(3).and_then(|&code| Direction::from_byte(code)),
            _ => None,
        };
        Some(Self {
            node,
            distance,
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bring_up_sequence() {
        let frames: heapless::Vec<CanFrame, 4> =
            BRING_UP_SEQUENCE.iter().map(StaticFrame::to_frame).collect();
        assert_eq!(frames[0].id, 0x0050);
        assert_eq!(frames[0].data.as_slice(), &[0x01, 0x00]);
        assert_eq!(frames[1].id, 0x0028);
        assert_eq!(frames[1].dlc(), 8);
        assert_eq!(frames[2].data.as_slice(), &[0x01, 0x2A]);
        assert_eq!(frames[3].data.as_slice(), &[0u8; 8]);
    }

    #[test]
    fn test_select_mode_frames() {
        let frame = LinkRequest::SelectMode(SensorMode::String).to_frame();
        assert_eq!(frame.id, ID_HANDSHAKE_REQUEST);
        assert_eq!(frame.data.as_slice(), &[0x01, 0x0F, 0x00, 0x19, 0x01]);

        let frame = LinkRequest::SelectMode(SensorMode::Surface).to_frame();
        assert_eq!(frame.data.as_slice(), &[0x01, 0x0F, 0x00, 0x19, 0x02]);

        assert_eq!(
            LinkRequest::SelectMode(SensorMode::BigSki).expected_ack(),
            [0x01, 0x0F, 0x00, 0x00, 0x19, 0x00]
        );
    }

    #[test]
    fn test_set_target_negates() {
        let request = LinkRequest::SetTarget {
            node: 0,
            target: 300,
        };
        // -300 = 0xFED4
        assert_eq!(
            request.to_frame().data.as_slice(),
            &[0x01, 0x0F, 0x00, 0x05, 0xFE, 0xD4]
        );
        assert_eq!(request.expected_ack(), [0x01, 0x0F, 0x00, 0x00, 0x05, 0x00]);
    }

    #[test]
    fn test_set_target_carries_node() {
        let request = LinkRequest::SetTarget {
            node: 2,
            target: -1,
        };
        assert_eq!(
            request.to_frame().data.as_slice(),
            &[0x01, 0x0F, 0x02, 0x05, 0x00, 0x01]
        );
        assert_eq!(request.expected_ack(), [0x01, 0x0F, 0x02, 0x00, 0x05, 0x00]);
    }

    #[test]
    fn test_set_target_min_saturates() {
        let request = LinkRequest::SetTarget {
            node: 0,
            target: i16::MIN,
        };
        assert_eq!(&request.to_frame().data[4..], &[0x7F, 0xFF]);
    }

    #[test]
    fn test_finalize_frames() {
        assert_eq!(
            LinkRequest::Finalize.to_frame().data.as_slice(),
            &[0x01, 0x0F, 0x00, 0x03, 0x06]
        );
        assert_eq!(
            LinkRequest::FinalizeMulti.to_frame().data.as_slice(),
            &[0x01, 0x0F, 0x00, 0x12, 0x00]
        );
        assert_eq!(
            LinkRequest::FinalizeMulti.expected_ack(),
            [0x01, 0x0F, 0x00, 0x00, 0x12, 0x00]
        );
    }

    #[test]
    fn test_ack_matching() {
        let request = LinkRequest::Finalize;
        let ack = CanFrame::new(ID_HANDSHAKE_ACK, &[0x01, 0x0F, 0x00, 0x00, 0x03, 0x00]).unwrap();
        assert!(request.is_acked_by(&ack));

        let wrong_cmd =
            CanFrame::new(ID_HANDSHAKE_ACK, &[0x01, 0x0F, 0x00, 0x00, 0x19, 0x00]).unwrap();
        assert!(!request.is_acked_by(&wrong_cmd));

        let wrong_id = CanFrame::new(0x07EC, &[0x01, 0x0F, 0x00, 0x00, 0x03, 0x00]).unwrap();
        assert!(!request.is_acked_by(&wrong_id));

        let short = CanFrame::new(ID_HANDSHAKE_ACK, &[0x01, 0x0F, 0x00]).unwrap();
        assert!(!request.is_acked_by(&short));
    }

    #[test]
    fn test_feedback_pair() {
        let a = feedback_value(-2);
        assert_eq!(a.id, 0x0028);
        assert_eq!(
            a.data.as_slice(),
            &[0xFF, 0xFE, 0x00, 0x00, 0x00, 0x00, 0x0F, 0xFF]
        );

        let b = feedback_trailer();
        assert_eq!(b.id, 0x03F0);
        assert_eq!(b.data.as_slice(), &[0x2F, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_distance_report_primary() {
        let frame = CanFrame::new(0x02A7, &[0x02, 0x01, 0x2C, 0x03]).unwrap();
        let report = DistanceReport::from_frame(&frame).unwrap();
        assert_eq!(report.node, SensorNode::Primary);
        assert_eq!(report.distance, 300);
        assert_eq!(report.direction, Some(Direction::Right));
    }

    #[test]
    fn test_distance_report_secondary_has_no_direction() {
        let frame = CanFrame::new(0x02AB, &[0x02, 0xFF, 0x9C, 0x01]).unwrap();
        let report = DistanceReport::from_frame(&frame).unwrap();
        assert_eq!(report.node, SensorNode::Tertiary);
        assert_eq!(report.distance, -100);
        assert_eq!(report.direction, None);
    }

    #[test]
    fn test_distance_report_rejects() {
        // Wrong tag
        let frame = CanFrame::new(0x02A7, &[0x03, 0x00, 0x10]).unwrap();
        assert_eq!(DistanceReport::from_frame(&frame), None);

        // Too short
        let frame = CanFrame::new(0x02A7, &[0x02, 0x00]).unwrap();
        assert_eq!(DistanceReport::from_frame(&frame), None);

        // Unknown id
        let frame = CanFrame::new(0x07ED, &[0x02, 0x00, 0x10]).unwrap();
        assert_eq!(DistanceReport::from_frame(&frame), None);
    }

    #[test]
    fn test_distance_report_unknown_direction() {
        let frame = CanFrame::new(0x02A7, &[0x02, 0x00, 0x10, 0x09]).unwrap();
        let report = DistanceReport::from_frame(&frame).unwrap();
        assert_eq!(report.direction, None);
    }
}
