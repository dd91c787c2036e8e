use utoipa::OpenApi;

use crate::api::attendance::{AttendanceRow, UpdateAttendance};
use crate::api::employee::CreateEmployee;
use crate::api::nfc::LinkCard;
use crate::api::scan::ScanRequest;
use crate::model::{AttendanceSession, Employee, ScanAction};
use crate::scan::ScanRecorded;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inoutly Attendance API",
        version = "1.0.0",
        description = r#"
## NFC Employee Attendance System

Tracks employee attendance via NFC badge scans and pushes state changes to
connected dashboards over WebSocket (`GET /ws`) in real time.

### Key Features
- **NFC Scan Reconciliation**
  - A raw badge scan is resolved into a clock-in or clock-out, with
    minimum-duration and debounce guards against duplicate reader events
- **Attendance Management**
  - Completed session listing, live in-office view, administrative edits
- **NFC Card Linking**
  - One card per employee, enforced

Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::scan::nfc_scan,
        crate::api::nfc::link_card,

        crate::api::attendance::list_attendance,
        crate::api::attendance::in_office,
        crate::api::attendance::update_attendance,

        crate::api::employee::list_employees,
        crate::api::employee::create_employee,
    ),
    components(
        schemas(
            Employee,
            AttendanceSession,
            ScanAction,
            ScanRecorded,
            ScanRequest,
            LinkCard,
            AttendanceRow,
            UpdateAttendance,
            CreateEmployee,
        )
    ),
    tags(
        (name = "NFC", description = "Badge scan ingestion and card linking"),
        (name = "Attendance", description = "Attendance records and live status"),
        (name = "Employee", description = "Employee administration"),
    )
)]
pub struct ApiDoc;
