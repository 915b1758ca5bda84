//! Direction codes reported by the string-line sensor.
//!
//! The string sensor reports, besides the distance, which side of the line
//! the head is on. The code sits in byte 3 of the distance report.

/// Wire codes
pub mod codes {
    pub const FORCE_LEFT: u8 = 0;
    pub const LEFT: u8 = 1;
    pub const MIDDLE: u8 = 2;
    pub const RIGHT: u8 = 3;
    pub const FORCE_RIGHT: u8 = 4;
}

/// Lateral position relative to the reference string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Far off to the left
    ForceLeft,
    Left,
    /// Centered on the string
    #[default]
    Middle,
    Right,
    /// Far off to the right
    ForceRight,
}

impl Direction {
    /// Parse a direction from its wire code
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            codes::FORCE_LEFT => Some(Direction::ForceLeft),
            codes::LEFT => Some(Direction::Left),
            codes::MIDDLE => Some(Direction::Middle),
            codes::RIGHT => Some(Direction::Right),
            codes::FORCE_RIGHT => Some(Direction::ForceRight),
            _ => None,
        }
    }

    /// Convert to wire code
    pub fn to_byte(self) -> u8 {
        match self {
            Direction::ForceLeft => codes::FORCE_LEFT,
            Direction::Left => codes::LEFT,
            Direction::Middle => codes::MIDDLE,
            Direction::Right => codes::RIGHT,
            Direction::ForceRight => codes::FORCE_RIGHT,
        }
    }

    /// True for the two far-off positions
    pub fn is_forced(self) -> bool {
        matches!(self, Direction::ForceLeft | Direction::ForceRight)
    }
}
