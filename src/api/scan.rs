use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

use crate::model::ScanAction;
use crate::scan::{ScanError, ScanReconciler, ScanRecorded};
use crate::store::StoreError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanRequest {
    #[schema(example = "04E91A2A3B5C80")]
    pub nfc_card_id: String,
    /// Scan instant reported by the device; server clock when absent.
    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// NFC scan ingestion
#[utoipa::path(
    post,
    path = "/api/nfc/scan",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan reconciled into a clock-in or clock-out", body = ScanRecorded),
        (status = 400, description = "Rejected: too soon after clock-in, or duplicate scan", body = Object, example = json!({
            "error": "Too fast! Wait 5 more seconds before clocking out",
            "wait_time": 5
        })),
        (status = 404, description = "NFC card not assigned to any employee", body = Object, example = json!({
            "error": "NFC card not assigned to any employee",
            "nfc_card_id": "04E91A2A3B5C80"
        })),
        (status = 500, description = "Internal server error"),
        (status = 503, description = "Storage temporarily unavailable")
    ),
    tag = "NFC"
)]
pub async fn nfc_scan(
    reconciler: web::Data<ScanReconciler>,
    payload: web::Json<ScanRequest>,
) -> impl Responder {
    let scan_time = payload.timestamp.unwrap_or_else(Utc::now);

    match reconciler.reconcile(&payload.nfc_card_id, scan_time).await {
        Ok(recorded) => {
            let message = match recorded.action {
                ScanAction::ClockIn => "Clocked In",
                _ => "Clocked Out",
            };
            HttpResponse::Ok().json(json!({
                "success": true,
                "employee": recorded.employee,
                "action": recorded.action,
                "attendance": recorded.attendance,
                "message": message
            }))
        }

        Err(ScanError::UnknownBadge { nfc_card_id }) => HttpResponse::NotFound().json(json!({
            "error": "NFC card not assigned to any employee",
            "nfc_card_id": nfc_card_id
        })),

        Err(ScanError::TooSoon { wait_secs }) => HttpResponse::BadRequest().json(json!({
            "error": format!("Too fast! Wait {wait_secs} more seconds before clocking out"),
            "wait_time": wait_secs
        })),

        Err(ScanError::TooFrequent) => HttpResponse::BadRequest().json(json!({
            "error": "Please wait before scanning again"
        })),

        Err(ScanError::Store(e @ (StoreError::Timeout | StoreError::Unavailable(_)))) => {
            error!(error = %e, nfc_card_id = %payload.nfc_card_id, "Storage failure during scan");
            HttpResponse::ServiceUnavailable().json(json!({
                "error": "Storage temporarily unavailable, please scan again"
            }))
        }

        Err(ScanError::Store(e)) => {
            // Invariant violations surviving the race re-read are bugs.
            error!(error = %e, nfc_card_id = %payload.nfc_card_id, "Scan reconciliation anomaly");
            HttpResponse::InternalServerError().json(json!({
                "error": "Internal Server Error"
            }))
        }
    }
}
