use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

use crate::model::Employee;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Jane Smith")]
    pub name: String,
    #[schema(example = "jane.smith@company.com", nullable = true)]
    pub email: Option<String>,
    #[schema(example = "Marketing")]
    pub department: String,
    #[schema(example = "Marketing Manager", nullable = true)]
    pub position: Option<String>,
}

/// List active employees
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "Active employees", body = [Employee])
    ),
    tag = "Employee"
)]
pub async fn list_employees(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let employees = sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, name, email, department, position, nfc_card_id, status
        FROM employees
        WHERE status = 'active'
        ORDER BY id
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch employees");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(employees))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    let result = sqlx::query(
        r#"
        INSERT INTO employees (name, email, department, position, status)
        VALUES (?, ?, ?, ?, 'active')
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.department)
    .bind(&payload.position)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create employee");
        ErrorInternalServerError("Database error")
    })?;

    let employee = sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, name, email, department, position, nfc_card_id, status
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(result.last_insert_id())
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch created employee");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Created().json(json!(employee)))
}
