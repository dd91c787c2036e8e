use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::model::{AttendanceSession, Employee, ScanAction};

/// State-change notifications fanned out to connected dashboards. The JSON
/// shape is what observers see on the wire, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttendanceEvent {
    AttendanceRecorded {
        employee: Employee,
        attendance: AttendanceSession,
        action: ScanAction,
        scan_time: DateTime<Utc>,
    },
    NfcUnassigned {
        nfc_card_id: String,
        scan_time: DateTime<Utc>,
    },
    /// Initial snapshot sent only to a newly connected observer.
    Connection {
        message: String,
        in_office: Vec<Employee>,
    },
}

impl AttendanceEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AttendanceEvent::AttendanceRecorded { .. } => "attendance_recorded",
            AttendanceEvent::NfcUnassigned { .. } => "nfc_unassigned",
            AttendanceEvent::Connection { .. } => "connection",
        }
    }
}

/// Fan-out over a tokio broadcast channel. Delivery is best-effort: no
/// subscribers is fine, lagged subscribers skip ahead, and per-observer
/// ordering is the channel's FIFO.
#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<AttendanceEvent>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: AttendanceEvent) {
        debug!(event_type = event.event_type(), "Broadcasting event");
        // Err only means nobody is listening right now.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AttendanceEvent> {
        self.tx.subscribe()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(64)
    }
}
