//! Persistent settings storage trait

use core::future::Future;

/// Errors from settings storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Nothing stored yet
    NotFound,
    /// Underlying flash operation failed
    Storage,
    /// Buffer too small for the stored data
    BufferTooSmall,
}

/// Storage for the settings record
///
/// Implementations should handle wear leveling and data integrity;
/// callers see a single opaque record.
pub trait SettingsStore {
    /// Read the record into `buffer`, returning its length
    fn read(&mut self, buffer: &mut [u8]) -> impl Future<Output = Result<usize, StoreError>>;

    /// Replace the record
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<(), StoreError>>;
}
