//! Flash settings storage
//!
//! Uses sequential-storage for wear-leveled key-value storage in the last
//! 8KB (four 2KB pages) of the STM32F103RC flash. The blocking flash driver
//! is wrapped with embassy-embedded-hal's `BlockingAsync` to provide the
//! async `NorFlash` that sequential-storage needs.

use core::ops::Range;

use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_stm32::flash::{Blocking, Flash, FLASH_SIZE};
use sequential_storage::cache::NoCache;
use sequential_storage::map;

use gradelink_core::config::persist::MAX_SETTINGS_SIZE;
use gradelink_core::traits::{SettingsStore, StoreError};

/// Size of the settings partition
pub const SETTINGS_PARTITION_SIZE: u32 = 8 * 1024;

/// Flash range for the settings partition (offsets from the flash base)
pub const SETTINGS_RANGE: Range<u32> =
    (FLASH_SIZE as u32 - SETTINGS_PARTITION_SIZE)..(FLASH_SIZE as u32);

/// Map key of the settings record
const SETTINGS_KEY: u8 = 1;

/// Record plus the map's item header
const DATA_BUFFER_SIZE: usize = MAX_SETTINGS_SIZE + 32;

pub struct FlashSettingsStore {
    flash: BlockingAsync<Flash<'static, Blocking>>,
}

impl FlashSettingsStore {
    pub fn new(flash: Flash<'static, Blocking>) -> Self {
        Self {
            flash: BlockingAsync::new(flash),
        }
    }
}

impl SettingsStore for FlashSettingsStore {
    async fn read(&mut self, buffer: &mut [u8]) -> Result<usize, StoreError> {
        let mut data_buffer = [0u8; DATA_BUFFER_SIZE];

        let result = map::fetch_item::<u8, &[u8], _>(
            &mut self.flash,
            SETTINGS_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &SETTINGS_KEY,
        )
        .await;

        match result {
            Ok(Some(data)) => {
                let len = data.len();
                let target = buffer.get_mut(..len).ok_or(StoreError::BufferTooSmall)?;
                target.copy_from_slice(data);
                Ok(len)
            }
            Ok(None) => Err(StoreError::NotFound),
            Err(_) => Err(StoreError::Storage),
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), StoreError> {
        let mut data_buffer = [0u8; DATA_BUFFER_SIZE];

        map::store_item(
            &mut self.flash,
            SETTINGS_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &SETTINGS_KEY,
            &data,
        )
        .await
        .map_err(|_| StoreError::Storage)
    }
}
