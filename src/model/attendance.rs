use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One clock-in/clock-out cycle. `clock_out = None` means the session is
/// still open; an employee has at most one open session at any time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceSession {
    #[schema(example = 42)]
    pub id: u64,

    #[schema(example = 1)]
    pub employee_id: u64,

    /// Calendar date of the clock-in event, in the configured reporting
    /// timezone offset.
    #[schema(example = "2026-08-30", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(value_type = String, format = "date-time")]
    pub clock_in: DateTime<Utc>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub clock_out: Option<DateTime<Utc>>,

    /// Derived on clock-out: (clock_out - clock_in) in hours.
    #[schema(example = 8.25, nullable = true)]
    pub total_hours: Option<f64>,

    #[schema(example = "present")]
    pub status: String,
}

impl AttendanceSession {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }
}
