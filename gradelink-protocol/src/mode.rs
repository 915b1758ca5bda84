//! Sensor modes and the physical sensor nodes they use.

/// Physical sensor node on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorNode {
    /// Main node; the only one in surface and string modes
    Primary,
    Secondary,
    Tertiary,
}

impl SensorNode {
    /// All nodes in channel index order
    pub const ALL: [SensorNode; 3] = [
        SensorNode::Primary,
        SensorNode::Secondary,
        SensorNode::Tertiary,
    ];

    /// Distance report identifier
    pub const fn id(self) -> u16 {
        match self {
            SensorNode::Primary => 0x02A7,
            SensorNode::Secondary => 0x02A8,
            SensorNode::Tertiary => 0x02AB,
        }
    }

    /// Look up a node by its report identifier
    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|node| node.id() == id)
    }

    /// Channel index (also the node index used in multi-sensor handshakes)
    pub const fn index(self) -> usize {
        match self {
            SensorNode::Primary => 0,
            SensorNode::Secondary => 1,
            SensorNode::Tertiary => 2,
        }
    }
}

/// Measuring mode of the remote sensor unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorMode {
    /// Single sonic sensor over a surface
    #[default]
    Surface,
    /// Single sensor following a reference string
    String,
    /// Three sensors along a beam, averaged
    BigSki,
}

impl SensorMode {
    pub const ALL: [SensorMode; 3] = [SensorMode::Surface, SensorMode::String, SensorMode::BigSki];

    /// Persisted code
    pub const fn code(self) -> u8 {
        match self {
            SensorMode::Surface => 1,
            SensorMode::String => 2,
            SensorMode::BigSki => 3,
        }
    }

    /// Parse a persisted code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.code() == code)
    }

    /// Code sent in the select-mode handshake step
    pub const fn handshake_code(self) -> u8 {
        match self {
            SensorMode::String => 0x01,
            SensorMode::Surface | SensorMode::BigSki => 0x02,
        }
    }

    /// Zero-based slot for per-mode tables
    pub const fn index(self) -> usize {
        (self.code() - 1) as usize
    }

    /// True if the mode uses all three sensor nodes
    pub const fn is_multi(self) -> bool {
        matches!(self, SensorMode::BigSki)
    }

    /// Sensor nodes this mode reads from
    pub fn nodes(self) -> &'static [SensorNode] {
        if self.is_multi() {
            &SensorNode::ALL
        } else {
            &SensorNode::ALL[..1]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids() {
        assert_eq!(SensorNode::from_id(0x02A7), Some(SensorNode::Primary));
        assert_eq!(SensorNode::from_id(0x02A8), Some(SensorNode::Secondary));
        assert_eq!(SensorNode::from_id(0x02AB), Some(SensorNode::Tertiary));
        assert_eq!(SensorNode::from_id(0x02A9), None);
    }

    #[test]
    fn test_mode_codes() {
        for mode in SensorMode::ALL {
            assert_eq!(SensorMode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(SensorMode::from_code(0), None);
        assert_eq!(SensorMode::from_code(4), None);
    }

    #[test]
    fn test_handshake_codes() {
        assert_eq!(SensorMode::Surface.handshake_code(), 0x02);
        assert_eq!(SensorMode::String.handshake_code(), 0x01);
        assert_eq!(SensorMode::BigSki.handshake_code(), 0x02);
    }

    #[test]
    fn test_mode_nodes() {
        assert_eq!(SensorMode::Surface.nodes(), &[SensorNode::Primary]);
        assert_eq!(SensorMode::String.nodes(), &[SensorNode::Primary]);
        assert_eq!(SensorMode::BigSki.nodes().len(), 3);
    }
}
