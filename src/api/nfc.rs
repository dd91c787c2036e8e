use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LinkCard {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "04E91A2A3B5C80")]
    pub nfc_card_id: String,
}

/// Link an NFC card to an employee
///
/// At most one active employee per card id; the unique index backs this
/// check against concurrent links.
#[utoipa::path(
    post,
    path = "/api/nfc/link",
    request_body = LinkCard,
    responses(
        (status = 200, description = "Card linked", body = Object, example = json!({
            "success": true,
            "message": "NFC card linked successfully"
        })),
        (status = 400, description = "Card already linked to another employee", body = Object, example = json!({
            "error": "NFC card already linked to another employee"
        })),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "NFC"
)]
pub async fn link_card(
    pool: web::Data<MySqlPool>,
    payload: web::Json<LinkCard>,
) -> actix_web::Result<impl Responder> {
    let holder = sqlx::query_scalar::<_, u64>(
        r#"SELECT id FROM employees WHERE nfc_card_id = ? LIMIT 1"#,
    )
    .bind(&payload.nfc_card_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to check NFC card holder");
        ErrorInternalServerError("Database error")
    })?;

    if let Some(holder_id) = holder {
        if holder_id != payload.employee_id {
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "NFC card already linked to another employee"
            })));
        }
    }

    let result = sqlx::query(r#"UPDATE employees SET nfc_card_id = ? WHERE id = ?"#)
        .bind(&payload.nfc_card_id)
        .bind(payload.employee_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) if res.rows_affected() == 0 => Ok(HttpResponse::NotFound().json(json!({
            "error": "Employee not found"
        }))),
        Ok(_) => {
            info!(
                employee_id = payload.employee_id,
                nfc_card_id = %payload.nfc_card_id,
                "NFC card linked"
            );
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "message": "NFC card linked successfully"
            })))
        }
        Err(e) => {
            // Unique index caught a concurrent link of the same card.
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::BadRequest().json(json!({
                        "error": "NFC card already linked to another employee"
                    })));
                }
            }
            error!(error = %e, "Failed to link NFC card");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Internal Server Error"
            })))
        }
    }
}
