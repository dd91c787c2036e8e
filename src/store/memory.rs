use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::model::{AttendanceSession, Employee, ScanLogEntry};
use crate::store::{SessionEdit, SessionStore, StoreError, elapsed_hours};

#[derive(Default)]
struct Inner {
    employees: Vec<Employee>,
    sessions: Vec<AttendanceSession>,
    scan_log: Vec<ScanLogEntry>,
    next_session_id: u64,
}

/// In-memory session store. Backs the reconciler tests and small demo
/// deployments that do not want a database. The open-session invariant is
/// enforced by an explicit check under the lock, mirroring what the unique
/// index does in MySQL.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: Mutex<Inner>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employees(employees: Vec<Employee>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                employees,
                next_session_id: 0,
                ..Inner::default()
            }),
        }
    }

    pub async fn sessions(&self) -> Vec<AttendanceSession> {
        self.inner.lock().await.sessions.clone()
    }

    pub async fn scan_log(&self) -> Vec<ScanLogEntry> {
        self.inner.lock().await.scan_log.clone()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn resolve_employee_by_badge(
        &self,
        badge_id: &str,
    ) -> Result<Option<Employee>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .employees
            .iter()
            .find(|e| e.nfc_card_id.as_deref() == Some(badge_id) && e.status == "active")
            .cloned())
    }

    async fn find_open_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceSession>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sessions
            .iter()
            .filter(|s| s.employee_id == employee_id && s.date == date && s.is_open())
            .max_by_key(|s| s.clock_in)
            .cloned())
    }

    async fn create_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
        clock_in: DateTime<Utc>,
    ) -> Result<AttendanceSession, StoreError> {
        let mut inner = self.inner.lock().await;

        if inner
            .sessions
            .iter()
            .any(|s| s.employee_id == employee_id && s.is_open())
        {
            return Err(StoreError::ConflictingOpenSession);
        }

        inner.next_session_id += 1;
        let session = AttendanceSession {
            id: inner.next_session_id,
            employee_id,
            date,
            clock_in,
            clock_out: None,
            total_hours: None,
            status: "present".to_string(),
        };
        inner.sessions.push(session.clone());
        Ok(session)
    }

    async fn close_session(
        &self,
        session_id: u64,
        clock_out: DateTime<Utc>,
        total_hours: f64,
    ) -> Result<AttendanceSession, StoreError> {
        let mut inner = self.inner.lock().await;
        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id && s.is_open())
            .ok_or(StoreError::NotFound)?;

        session.clock_out = Some(clock_out);
        session.total_hours = Some(total_hours);
        Ok(session.clone())
    }

    async fn edit_session(
        &self,
        session_id: u64,
        edit: SessionEdit,
    ) -> Result<AttendanceSession, StoreError> {
        let mut inner = self.inner.lock().await;
        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or(StoreError::NotFound)?;

        let clock_in = edit.clock_in.unwrap_or(session.clock_in);
        let clock_out = edit.clock_out.or(session.clock_out);

        let total_hours = match clock_out {
            Some(out) => {
                if out < clock_in {
                    return Err(StoreError::InvalidRange);
                }
                Some(elapsed_hours(clock_in, out))
            }
            None => None,
        };

        session.clock_in = clock_in;
        session.clock_out = clock_out;
        session.total_hours = total_hours;
        Ok(session.clone())
    }

    async fn append_scan_log(&self, entry: ScanLogEntry) -> Result<(), StoreError> {
        self.inner.lock().await.scan_log.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn employee(id: u64, badge: &str) -> Employee {
        Employee {
            id,
            name: format!("Employee {id}"),
            email: None,
            department: "Engineering".to_string(),
            position: None,
            nfc_card_id: Some(badge.to_string()),
            status: "active".to_string(),
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 30, h, m, s).unwrap()
    }

    #[tokio::test]
    async fn second_open_session_is_rejected() {
        let store = InMemorySessionStore::with_employees(vec![employee(1, "B1")]);
        let date = at(10, 0, 0).date_naive();

        store.create_session(1, date, at(10, 0, 0)).await.unwrap();
        let err = store.create_session(1, date, at(10, 0, 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::ConflictingOpenSession));
    }

    #[tokio::test]
    async fn close_is_one_shot() {
        let store = InMemorySessionStore::new();
        let date = at(9, 0, 0).date_naive();
        let session = store.create_session(1, date, at(9, 0, 0)).await.unwrap();

        store.close_session(session.id, at(17, 0, 0), 8.0).await.unwrap();
        let err = store
            .close_session(session.id, at(18, 0, 0), 9.0)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn edit_rejects_inverted_range() {
        let store = InMemorySessionStore::new();
        let date = at(9, 0, 0).date_naive();
        let session = store.create_session(1, date, at(9, 0, 0)).await.unwrap();

        let err = store
            .edit_session(
                session.id,
                SessionEdit {
                    clock_in: None,
                    clock_out: Some(at(8, 0, 0)),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRange));

        // Nothing written on rejection.
        let sessions = store.sessions().await;
        assert_eq!(sessions[0].clock_out, None);
        assert_eq!(sessions[0].total_hours, None);
    }

    #[tokio::test]
    async fn edit_recomputes_hours() {
        let store = InMemorySessionStore::new();
        let date = at(9, 0, 0).date_naive();
        let session = store.create_session(1, date, at(9, 0, 0)).await.unwrap();
        store.close_session(session.id, at(17, 0, 0), 8.0).await.unwrap();

        let edited = store
            .edit_session(
                session.id,
                SessionEdit {
                    clock_in: Some(at(10, 0, 0)),
                    clock_out: None,
                },
            )
            .await
            .unwrap();
        assert!((edited.total_hours.unwrap() - 7.0).abs() < 1e-6);
    }
}
