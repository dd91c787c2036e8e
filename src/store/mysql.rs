use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::MySqlPool;
use tracing::error;

use crate::model::{AttendanceSession, Employee, ScanLogEntry};
use crate::store::{SessionEdit, SessionStore, StoreError, elapsed_hours};

/// MySQL-backed session store. The single-open-session invariant is carried
/// by the schema: a generated `open_flag` column (1 while `clock_out IS
/// NULL`, NULL otherwise) under a unique `(employee_id, open_flag)` index,
/// so a second open INSERT fails with a duplicate-key error.
pub struct MySqlSessionStore {
    pool: MySqlPool,
    timeout: Duration,
}

impl MySqlSessionStore {
    pub fn new(pool: MySqlPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Every query runs under a bounded timeout; exceeding it surfaces
    /// `Timeout` with no partial mutation observed by the caller.
    async fn run<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_sqlx_error(e)),
            Err(_) => Err(StoreError::Timeout),
        }
    }

    async fn fetch_session(&self, session_id: u64) -> Result<AttendanceSession, StoreError> {
        self.run(
            sqlx::query_as::<_, AttendanceSession>(
                r#"
                SELECT id, employee_id, date, clock_in, clock_out, total_hours, status
                FROM attendance
                WHERE id = ?
                "#,
            )
            .bind(session_id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StoreError::NotFound)
    }
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolTimedOut => StoreError::Timeout,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000") => {
            StoreError::ConflictingOpenSession
        }
        _ => StoreError::Unavailable(e.to_string()),
    }
}

#[async_trait]
impl SessionStore for MySqlSessionStore {
    async fn resolve_employee_by_badge(
        &self,
        badge_id: &str,
    ) -> Result<Option<Employee>, StoreError> {
        self.run(
            sqlx::query_as::<_, Employee>(
                r#"
                SELECT id, name, email, department, position, nfc_card_id, status
                FROM employees
                WHERE nfc_card_id = ? AND status = 'active'
                "#,
            )
            .bind(badge_id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn find_open_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceSession>, StoreError> {
        self.run(
            sqlx::query_as::<_, AttendanceSession>(
                r#"
                SELECT id, employee_id, date, clock_in, clock_out, total_hours, status
                FROM attendance
                WHERE employee_id = ? AND date = ? AND clock_out IS NULL
                ORDER BY clock_in DESC
                LIMIT 1
                "#,
            )
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn create_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
        clock_in: DateTime<Utc>,
    ) -> Result<AttendanceSession, StoreError> {
        let result = self
            .run(
                sqlx::query(
                    r#"
                    INSERT INTO attendance (employee_id, date, clock_in, status)
                    VALUES (?, ?, ?, 'present')
                    "#,
                )
                .bind(employee_id)
                .bind(date)
                .bind(clock_in)
                .execute(&self.pool),
            )
            .await?;

        self.fetch_session(result.last_insert_id()).await
    }

    async fn close_session(
        &self,
        session_id: u64,
        clock_out: DateTime<Utc>,
        total_hours: f64,
    ) -> Result<AttendanceSession, StoreError> {
        // Conditional on clock_out IS NULL: a session closes exactly once,
        // and a racing second clock-out observes NotFound.
        let result = self
            .run(
                sqlx::query(
                    r#"
                    UPDATE attendance
                    SET clock_out = ?, total_hours = ?
                    WHERE id = ? AND clock_out IS NULL
                    "#,
                )
                .bind(clock_out)
                .bind(total_hours)
                .bind(session_id)
                .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        self.fetch_session(session_id).await
    }

    async fn edit_session(
        &self,
        session_id: u64,
        edit: SessionEdit,
    ) -> Result<AttendanceSession, StoreError> {
        let current = self.fetch_session(session_id).await?;

        let clock_in = edit.clock_in.unwrap_or(current.clock_in);
        let clock_out = edit.clock_out.or(current.clock_out);

        let total_hours = match clock_out {
            Some(out) => {
                if out < clock_in {
                    return Err(StoreError::InvalidRange);
                }
                Some(elapsed_hours(clock_in, out))
            }
            None => None,
        };

        self.run(
            sqlx::query(
                r#"
                UPDATE attendance
                SET clock_in = ?, clock_out = ?, total_hours = ?
                WHERE id = ?
                "#,
            )
            .bind(clock_in)
            .bind(clock_out)
            .bind(total_hours)
            .bind(session_id)
            .execute(&self.pool),
        )
        .await?;

        self.fetch_session(session_id).await
    }

    async fn append_scan_log(&self, entry: ScanLogEntry) -> Result<(), StoreError> {
        let result = self
            .run(
                sqlx::query(
                    r#"
                    INSERT INTO nfc_scan_logs (nfc_card_id, employee_id, scan_time, action)
                    VALUES (?, ?, ?, ?)
                    "#,
                )
                .bind(&entry.nfc_card_id)
                .bind(entry.employee_id)
                .bind(entry.scan_time)
                .bind(entry.action.as_str())
                .execute(&self.pool),
            )
            .await;

        if let Err(e) = &result {
            error!(error = %e, nfc_card_id = %entry.nfc_card_id, "Scan log insert failed");
        }
        result.map(|_| ())
    }
}
