//! Button input trait

/// Front panel buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    Up,
    Down,
    Mode,
    Enter,
    F1,
    F2,
    F3,
}

impl Button {
    pub const COUNT: usize = 7;

    pub const ALL: [Button; Self::COUNT] = [
        Button::Up,
        Button::Down,
        Button::Mode,
        Button::Enter,
        Button::F1,
        Button::F2,
        Button::F3,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Raw (undebounced) button levels
pub trait ButtonInputs {
    /// True while the button is physically pressed
    fn is_pressed(&mut self, button: Button) -> bool;
}
