use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::broadcast::{AttendanceEvent, Broadcaster};
use crate::model::{AttendanceSession, ScanAction, ScanLogEntry};
use crate::scan::{ScanDebouncer, ScanError, ScanPolicy, ScanRecorded};
use crate::store::{SessionStore, StoreError};

/// Maps a raw badge scan to a concrete session state transition.
///
/// Holds no persistent state of its own: sessions live in the injected
/// store, debounce entries are transient. Two guards protect against the
/// reader hardware: the minimum-duration guard stops a single tap from
/// being read as a full clock-in/clock-out pair, the debounce guard stops
/// duplicate delivery of the same action.
pub struct ScanReconciler {
    store: Arc<dyn SessionStore>,
    debouncer: ScanDebouncer,
    broadcaster: Broadcaster,
    policy: ScanPolicy,
}

impl ScanReconciler {
    pub fn new(
        store: Arc<dyn SessionStore>,
        debouncer: ScanDebouncer,
        broadcaster: Broadcaster,
        policy: ScanPolicy,
    ) -> Self {
        Self {
            store,
            debouncer,
            broadcaster,
            policy,
        }
    }

    pub async fn reconcile(
        &self,
        nfc_card_id: &str,
        scan_time: DateTime<Utc>,
    ) -> Result<ScanRecorded, ScanError> {
        let Some(employee) = self.store.resolve_employee_by_badge(nfc_card_id).await? else {
            return Err(self.reject_unassigned(nfc_card_id, scan_time).await);
        };

        let date = self.policy.bucket_date(scan_time);

        // A scan racing this one can win the session write between our read
        // and our write. The store refuses the stale write; one re-read puts
        // us on the branch consistent with the post-mutation state.
        let mut retried = false;
        let (action, session) = loop {
            let open = self.store.find_open_session(employee.id, date).await?;

            let result = match &open {
                Some(open) => self.clock_out(employee.id, open, scan_time).await,
                None => self.clock_in(employee.id, scan_time).await,
            };

            match result {
                Ok(outcome) => break outcome,
                Err(ScanError::Store(
                    e @ (StoreError::ConflictingOpenSession | StoreError::NotFound),
                )) if !retried => {
                    warn!(employee_id = employee.id, error = %e, "Scan lost a session race, re-reading");
                    retried = true;
                }
                Err(e) => return Err(e),
            }
        };

        // Advisory audit trail; the session mutation above is authoritative
        // even if this append fails.
        if let Err(e) = self
            .store
            .append_scan_log(ScanLogEntry {
                nfc_card_id: nfc_card_id.to_string(),
                employee_id: Some(employee.id),
                scan_time,
                action,
            })
            .await
        {
            warn!(employee_id = employee.id, error = %e, "Scan log append failed");
        }

        info!(
            employee_id = employee.id,
            action = action.as_str(),
            session_id = session.id,
            "Attendance recorded"
        );

        self.broadcaster.publish(AttendanceEvent::AttendanceRecorded {
            employee: employee.clone(),
            attendance: session.clone(),
            action,
            scan_time,
        });

        Ok(ScanRecorded {
            employee,
            action,
            attendance: session,
        })
    }

    async fn clock_out(
        &self,
        employee_id: u64,
        open: &AttendanceSession,
        scan_time: DateTime<Utc>,
    ) -> Result<(ScanAction, AttendanceSession), ScanError> {
        let elapsed_ms = (scan_time - open.clock_in).num_milliseconds();
        let min_ms = self.policy.min_session_secs as i64 * 1000;

        if elapsed_ms < min_ms {
            let wait_secs = (min_ms - elapsed_ms + 999) / 1000;
            return Err(ScanError::TooSoon { wait_secs });
        }

        if !self
            .debouncer
            .should_accept(employee_id, ScanAction::ClockOut, scan_time)
        {
            return Err(ScanError::TooFrequent);
        }

        let total_hours = elapsed_ms as f64 / 3_600_000.0;
        let closed = self
            .store
            .close_session(open.id, scan_time, total_hours)
            .await?;

        self.debouncer
            .record(employee_id, ScanAction::ClockOut, scan_time);
        Ok((ScanAction::ClockOut, closed))
    }

    async fn clock_in(
        &self,
        employee_id: u64,
        scan_time: DateTime<Utc>,
    ) -> Result<(ScanAction, AttendanceSession), ScanError> {
        if !self
            .debouncer
            .should_accept(employee_id, ScanAction::ClockIn, scan_time)
        {
            return Err(ScanError::TooFrequent);
        }

        let date = self.policy.bucket_date(scan_time);
        let created = self
            .store
            .create_session(employee_id, date, scan_time)
            .await?;

        self.debouncer
            .record(employee_id, ScanAction::ClockIn, scan_time);
        Ok((ScanAction::ClockIn, created))
    }

    /// Unassigned badges bypass the debounce and session machinery
    /// entirely: log the raw scan, tell the dashboards, touch nothing.
    async fn reject_unassigned(&self, nfc_card_id: &str, scan_time: DateTime<Utc>) -> ScanError {
        if let Err(e) = self
            .store
            .append_scan_log(ScanLogEntry {
                nfc_card_id: nfc_card_id.to_string(),
                employee_id: None,
                scan_time,
                action: ScanAction::Unassigned,
            })
            .await
        {
            warn!(nfc_card_id, error = %e, "Unassigned scan log append failed");
        }

        error!(nfc_card_id, "No employee found for scanned NFC card");

        self.broadcaster.publish(AttendanceEvent::NfcUnassigned {
            nfc_card_id: nfc_card_id.to_string(),
            scan_time,
        });

        ScanError::UnknownBadge {
            nfc_card_id: nfc_card_id.to_string(),
        }
    }
}
