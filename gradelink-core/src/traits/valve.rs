//! Valve output trait

/// Raise/lower valve pair
///
/// Outputs are write-only; callers track what they commanded. The trait
/// does not prevent both valves from being energized at once, so every
/// caller must switch the opposite valve off first.
pub trait ValveOutputs {
    /// Energize or release the raise valve
    fn set_up(&mut self, energized: bool);

    /// Energize or release the lower valve
    fn set_down(&mut self, energized: bool);

    /// Release both valves
    fn release(&mut self) {
        self.set_up(false);
        self.set_down(false);
    }
}
