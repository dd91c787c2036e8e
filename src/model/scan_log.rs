use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Action resolved for a badge scan. Also used as half of the debounce key,
/// hence the extra derives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanAction {
    ClockIn,
    ClockOut,
    Unassigned,
}

impl ScanAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanAction::ClockIn => "clock_in",
            ScanAction::ClockOut => "clock_out",
            ScanAction::Unassigned => "unassigned",
        }
    }
}

/// Append-only audit record of a scan attempt. Write-only from the core's
/// perspective; never read back for decision-making.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanLogEntry {
    pub nfc_card_id: String,
    pub employee_id: Option<u64>,
    pub scan_time: DateTime<Utc>,
    pub action: ScanAction,
}
