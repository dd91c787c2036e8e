pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::model::{AttendanceSession, Employee, ScanLogEntry};

pub use memory::InMemorySessionStore;
pub use mysql::MySqlSessionStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// An open session already exists for this employee. Should be
    /// unreachable after the open-session lookup, but the storage boundary
    /// enforces it anyway (unique index / locked check).
    #[error("an open session already exists for this employee")]
    ConflictingOpenSession,

    #[error("attendance session not found or already closed")]
    NotFound,

    #[error("clock-out cannot precede clock-in")]
    InvalidRange,

    #[error("storage operation timed out")]
    Timeout,

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Fields an administrator may correct on an existing session.
#[derive(Debug, Clone, Default)]
pub struct SessionEdit {
    pub clock_in: Option<DateTime<Utc>>,
    pub clock_out: Option<DateTime<Utc>>,
}

/// Narrow persistence contract the reconciler consumes. The core never sees
/// SQL; it is injected with an implementation of this trait.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn resolve_employee_by_badge(
        &self,
        badge_id: &str,
    ) -> Result<Option<Employee>, StoreError>;

    async fn find_open_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceSession>, StoreError>;

    /// Creates an OPEN session. Fails with `ConflictingOpenSession` if one
    /// already exists for the employee.
    async fn create_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
        clock_in: DateTime<Utc>,
    ) -> Result<AttendanceSession, StoreError>;

    /// Closes an open session exactly once. Fails with `NotFound` if the
    /// session is gone or already closed.
    async fn close_session(
        &self,
        session_id: u64,
        clock_out: DateTime<Utc>,
        total_hours: f64,
    ) -> Result<AttendanceSession, StoreError>;

    /// Administrative correction. Recomputes `total_hours` when both
    /// timestamps are present; fails with `InvalidRange` if the edited
    /// clock-out precedes the edited clock-in.
    async fn edit_session(
        &self,
        session_id: u64,
        edit: SessionEdit,
    ) -> Result<AttendanceSession, StoreError>;

    /// Best-effort audit append. Callers swallow failures; the session
    /// mutation stays authoritative.
    async fn append_scan_log(&self, entry: ScanLogEntry) -> Result<(), StoreError>;
}

/// Hours elapsed between two instants, millisecond precision.
pub(crate) fn elapsed_hours(clock_in: DateTime<Utc>, clock_out: DateTime<Utc>) -> f64 {
    (clock_out - clock_in).num_milliseconds() as f64 / 3_600_000.0
}
