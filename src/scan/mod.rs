pub mod debounce;
pub mod reconciler;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::model::{AttendanceSession, Employee, ScanAction};
use crate::store::StoreError;

pub use debounce::ScanDebouncer;
pub use reconciler::ScanReconciler;

/// Tunable policy for the reconciler. Defaults match the physical badge
/// reader this was built for: readers held near the sensor emit several
/// scan events per tap.
#[derive(Debug, Clone)]
pub struct ScanPolicy {
    /// Smallest accepted gap between clock-in and clock-out, in seconds.
    pub min_session_secs: u64,
    /// Repeat scans for the same (employee, action) inside this window are
    /// suppressed.
    pub debounce_window_secs: u64,
    /// Debounce entries are evicted after this long.
    pub debounce_ttl_secs: u64,
    /// Offset applied when deriving the attendance date from a scan
    /// instant. Stated once here, applied consistently.
    pub reporting_offset: FixedOffset,
}

impl ScanPolicy {
    pub fn bucket_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.reporting_offset).date_naive()
    }
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            min_session_secs: 10,
            debounce_window_secs: 2,
            debounce_ttl_secs: 20,
            reporting_offset: FixedOffset::east_opt(0).unwrap(),
        }
    }
}

/// Successful reconciliation envelope returned to the scanning device.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScanRecorded {
    pub employee: Employee,
    pub action: ScanAction,
    pub attendance: AttendanceSession,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("NFC card not assigned to any employee")]
    UnknownBadge { nfc_card_id: String },

    /// Clock-out attempted before the minimum session duration elapsed.
    /// Carries the remaining whole seconds for the device display.
    #[error("too fast, wait {wait_secs} more seconds before clocking out")]
    TooSoon { wait_secs: i64 },

    /// Debounce rejection; the device is expected to retry silently.
    #[error("please wait before scanning again")]
    TooFrequent,

    #[error(transparent)]
    Store(#[from] StoreError),
}
