//! Battery-backed register trait

/// A register that survives a system reset
///
/// Used to carry the last fatal error code across the reset that the
/// fault path forces.
pub trait BackupRegister {
    /// Read the stored value (0 when nothing was stored)
    fn read(&mut self) -> u16;

    fn write(&mut self, value: u16);

    fn clear(&mut self) {
        self.write(0);
    }
}
