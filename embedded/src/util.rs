use std::thread;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use esp_idf_svc::sntp::{
    EspSntp,
    SyncStatus,
};
use hasp_proximity::telemetry;

pub fn sync_time_via_ntp(sntp_instance: &EspSntp) {
    log::info!("Starting NTP time sync...");

    while sntp_instance.get_sync_status() != SyncStatus::Completed {
        log::info!("Waiting for NTP time sync...");
        thread::sleep(Duration::from_millis(500));
    }

    log::info!("NTP time sync completed: {}", local_time().format("%d/%m/%Y %H:%M:%S"));
}

/// Hours east of UTC, from `HASP_UTC_OFFSET` at build time.
fn utc_offset_hours() -> i32 {
    option_env!("HASP_UTC_OFFSET")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

/// Wall clock time for the sensors document.
pub fn local_time() -> NaiveDateTime {
    telemetry::local_time(Utc::now(), utc_offset_hours())
}
