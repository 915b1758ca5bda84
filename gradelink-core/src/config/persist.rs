//! Settings persistence
//!
//! Loads the settings record from a [`SettingsStore`], falling back to
//! compiled defaults when nothing is stored or the record is unusable.

use crate::status::{Status, StatusBus};
use crate::traits::{SettingsStore, StoreError};

use super::settings::{Settings, SettingsError};

/// Maximum serialized settings size
pub const MAX_SETTINGS_SIZE: usize = 128;

/// Settings persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistError {
    /// Storage operation failed
    Store(StoreError),
    /// Encoding or decoding failed
    Settings(SettingsError),
}

impl From<StoreError> for PersistError {
    fn from(e: StoreError) -> Self {
        PersistError::Store(e)
    }
}

impl From<SettingsError> for PersistError {
    fn from(e: SettingsError) -> Self {
        PersistError::Settings(e)
    }
}

/// Serialize settings into `buffer`
pub fn encode<'a>(settings: &Settings, buffer: &'a mut [u8]) -> Result<&'a mut [u8], SettingsError> {
    postcard::to_slice(settings, buffer).map_err(|_| SettingsError::Encode)
}

/// Deserialize settings without validating them
pub fn decode(bytes: &[u8]) -> Result<Settings, SettingsError> {
    postcard::from_bytes(bytes).map_err(|_| SettingsError::Decode)
}

/// Load settings from storage
///
/// Never fails: an empty store, an undecodable record, or an invalid one all
/// end with a usable record and `NEED_SAVE_SETTINGS` raised. A storage
/// failure is returned alongside the defaults so the caller can decide
/// whether it is fatal.
pub async fn load<S: SettingsStore>(
    store: &mut S,
    bus: &StatusBus,
) -> (Settings, Result<(), PersistError>) {
    match load_inner(store).await {
        Ok(settings) => {
            info!("Loaded settings");
            (settings.validated(bus), Ok(()))
        }
        Err(PersistError::Store(StoreError::NotFound)) => {
            debug!("No settings stored, using defaults");
            bus.set(Status::NeedSaveSettings);
            (Settings::default(), Ok(()))
        }
        Err(PersistError::Settings(e)) => {
            warn!("Stored settings unreadable: {:?}", e);
            bus.set(Status::NeedSaveSettings);
            (Settings::default(), Ok(()))
        }
        Err(e) => {
            warn!("Failed to load settings: {:?}", e);
            bus.set(Status::NeedSaveSettings);
            (Settings::default(), Err(e))
        }
    }
}

async fn load_inner<S: SettingsStore>(store: &mut S) -> Result<Settings, PersistError> {
    let mut buffer = [0u8; MAX_SETTINGS_SIZE];
    let len = store.read(&mut buffer).await?;
    debug!("Read {} bytes of settings", len);
    let bytes = buffer.get(..len).ok_or(StoreError::BufferTooSmall)?;
    Ok(decode(bytes)?)
}

/// Save settings and drop `NEED_SAVE_SETTINGS`
pub async fn save<S: SettingsStore>(
    store: &mut S,
    settings: &Settings,
    bus: &StatusBus,
) -> Result<(), PersistError> {
    let mut buffer = [0u8; MAX_SETTINGS_SIZE];
    let bytes = encode(settings, &mut buffer)?;
    debug!("Saving {} bytes of settings", bytes.len());

    store.write(bytes).await?;

    bus.reset(Status::NeedSaveSettings);
    info!("Saved settings");
    Ok(())
}
