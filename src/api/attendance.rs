use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::config::Config;
use crate::model::{AttendanceSession, Employee};
use crate::store::{SessionEdit, SessionStore, StoreError};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceQuery {
    pub employee: Option<u64>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRow {
    pub id: u64,
    pub employee_id: u64,
    pub employee_name: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub clock_in: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub clock_out: Option<DateTime<Utc>>,
    pub total_hours: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAttendance {
    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub clock_in: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub clock_out: Option<DateTime<Utc>>,
}

/// Completed attendance records, filterable by employee and date range
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(
        ("employee", Query, description = "Filter by employee id"),
        ("date", Query, description = "Exact date (overrides range)"),
        ("start_date", Query, description = "Range start"),
        ("end_date", Query, description = "Range end")
    ),
    responses(
        (status = 200, description = "Closed attendance sessions", body = [AttendanceRow])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let mut conditions = vec!["a.clock_out IS NOT NULL"];
    let mut dates: Vec<NaiveDate> = Vec::new();

    if query.employee.is_some() {
        conditions.push("a.employee_id = ?");
    }
    if let Some(date) = query.date {
        conditions.push("a.date = ?");
        dates.push(date);
    } else {
        if let Some(start) = query.start_date {
            conditions.push("a.date >= ?");
            dates.push(start);
        }
        if let Some(end) = query.end_date {
            conditions.push("a.date <= ?");
            dates.push(end);
        }
    }

    let sql = format!(
        r#"
        SELECT a.id, a.employee_id, e.name AS employee_name,
               a.date, a.clock_in, a.clock_out, a.total_hours
        FROM attendance a
        LEFT JOIN employees e ON a.employee_id = e.id
        WHERE {}
        ORDER BY a.date DESC, a.clock_in DESC
        "#,
        conditions.join(" AND ")
    );
    debug!(sql = %sql, "Fetching attendance");

    let mut q = sqlx::query_as::<_, AttendanceRow>(&sql);
    if let Some(employee_id) = query.employee {
        q = q.bind(employee_id);
    }
    for date in dates {
        q = q.bind(date);
    }

    let rows = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch attendance");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Employees currently clocked in (open session today).
pub async fn in_office_employees(
    pool: &MySqlPool,
    date: NaiveDate,
) -> Result<Vec<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        r#"
        SELECT e.id, e.name, e.email, e.department, e.position, e.nfc_card_id, e.status
        FROM employees e
        INNER JOIN attendance a ON e.id = a.employee_id
        WHERE a.date = ? AND a.clock_out IS NULL AND a.status = 'present'
        ORDER BY a.clock_in DESC
        "#,
    )
    .bind(date)
    .fetch_all(pool)
    .await
}

/// Who is in the office right now
#[utoipa::path(
    get,
    path = "/api/attendance/in-office",
    responses(
        (status = 200, description = "Employees with an open session today", body = [Employee])
    ),
    tag = "Attendance"
)]
pub async fn in_office(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let today = config.scan_policy().bucket_date(Utc::now());

    let employees = in_office_employees(pool.get_ref(), today)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch in-office employees");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(employees))
}

/// Administrative correction of a session's timestamps
#[utoipa::path(
    put,
    path = "/api/attendance/{id}",
    params(
        ("id", Path, description = "Attendance session ID")
    ),
    request_body = UpdateAttendance,
    responses(
        (status = 200, description = "Session updated, hours re-derived", body = AttendanceSession),
        (status = 400, description = "Clock-out precedes clock-in", body = Object, example = json!({
            "error": "Clock-out cannot precede clock-in"
        })),
        (status = 404, description = "Session not found"),
        (status = 503, description = "Storage temporarily unavailable")
    ),
    tag = "Attendance"
)]
pub async fn update_attendance(
    store: web::Data<dyn SessionStore>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAttendance>,
) -> impl Responder {
    let session_id = path.into_inner();

    let edit = SessionEdit {
        clock_in: payload.clock_in,
        clock_out: payload.clock_out,
    };

    if edit.clock_in.is_none() && edit.clock_out.is_none() {
        return HttpResponse::BadRequest().json(json!({
            "error": "No fields to update"
        }));
    }

    match store.edit_session(session_id, edit).await {
        Ok(session) => HttpResponse::Ok().json(session),

        Err(StoreError::InvalidRange) => HttpResponse::BadRequest().json(json!({
            "error": "Clock-out cannot precede clock-in"
        })),

        Err(StoreError::NotFound) => HttpResponse::NotFound().json(json!({
            "error": "Attendance session not found"
        })),

        Err(e @ (StoreError::Timeout | StoreError::Unavailable(_))) => {
            error!(error = %e, session_id, "Storage failure during attendance edit");
            HttpResponse::ServiceUnavailable().json(json!({
                "error": "Storage temporarily unavailable"
            }))
        }

        Err(e) => {
            error!(error = %e, session_id, "Failed to update attendance");
            HttpResponse::InternalServerError().json(json!({
                "error": "Internal Server Error"
            }))
        }
    }
}
