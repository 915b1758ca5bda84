//! Settings persistence task
//!
//! Writes each requested settings record to flash. A failed write is
//! retried until it succeeds or a newer record replaces it.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::Timer;

use gradelink_core::config::persist;

use crate::channels::{SAVE_REQUEST, STATUS};
use crate::storage::FlashSettingsStore;

/// Delay before retrying a failed write
const SAVE_RETRY_MS: u64 = 1000;

#[embassy_executor::task]
pub async fn settings_task(mut store: FlashSettingsStore) {
    info!("Settings task started");

    let mut pending = SAVE_REQUEST.wait().await;
    loop {
        match persist::save(&mut store, &pending, &STATUS).await {
            Ok(()) => pending = SAVE_REQUEST.wait().await,
            Err(e) => {
                warn!("Settings save failed: {:?}", e);
                if let Either::First(newer) =
                    select(SAVE_REQUEST.wait(), Timer::after_millis(SAVE_RETRY_MS)).await
                {
                    pending = newer;
                }
            }
        }
    }
}
