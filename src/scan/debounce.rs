use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;

use crate::model::ScanAction;

/// Suppresses duplicate scans per (employee, action). Entries are evicted
/// by the cache TTL, and age is additionally checked on read so an expired
/// entry can never block acceptance. Process-local and synchronous; losing
/// it on restart only re-admits duplicate hardware reads, audit correctness
/// does not depend on it.
#[derive(Clone)]
pub struct ScanDebouncer {
    entries: Cache<(u64, ScanAction), DateTime<Utc>>,
    window: chrono::Duration,
}

impl ScanDebouncer {
    pub fn new(window_secs: u64, ttl_secs: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(Duration::from_secs(ttl_secs))
                .build(),
            window: chrono::Duration::seconds(window_secs as i64),
        }
    }

    /// true when no accepted scan for this (employee, action) is younger
    /// than the debounce window.
    pub fn should_accept(&self, employee_id: u64, action: ScanAction, now: DateTime<Utc>) -> bool {
        match self.entries.get(&(employee_id, action)) {
            Some(last) => now - last >= self.window,
            None => true,
        }
    }

    pub fn record(&self, employee_id: u64, action: ScanAction, now: DateTime<Utc>) {
        self.entries.insert((employee_id, action), now);
    }
}
