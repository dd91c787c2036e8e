// Reconciler behavior over the in-memory store: guard rejections, session
// lifecycle, audit trail, and broadcast fan-out.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use tokio::sync::broadcast::error::TryRecvError;

use inoutly::broadcast::{AttendanceEvent, Broadcaster};
use inoutly::model::{AttendanceSession, Employee, ScanAction, ScanLogEntry};
use inoutly::scan::{ScanDebouncer, ScanError, ScanPolicy, ScanReconciler};
use inoutly::store::{InMemorySessionStore, SessionEdit, SessionStore, StoreError};

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

struct Fixture {
    store: Arc<InMemorySessionStore>,
    debouncer: ScanDebouncer,
    broadcaster: Broadcaster,
    reconciler: ScanReconciler,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemorySessionStore::with_employees(vec![employee(1, "B1")]));
    let policy = ScanPolicy::default();
    let debouncer = ScanDebouncer::new(policy.debounce_window_secs, policy.debounce_ttl_secs);
    let broadcaster = Broadcaster::new(16);
    let reconciler = ScanReconciler::new(
        store.clone(),
        debouncer.clone(),
        broadcaster.clone(),
        policy,
    );
    Fixture {
        store,
        debouncer,
        broadcaster,
        reconciler,
    }
}

#[tokio::test]
async fn scenario_a_full_cycle() {
    let f = fixture();

    // 10:00:00 — clock in, open session created
    let recorded = f.reconciler.reconcile("B1", at(10, 0, 0)).await.unwrap();
    assert_eq!(recorded.action, ScanAction::ClockIn);
    assert!(recorded.attendance.is_open());

    // 10:00:05 — too soon to clock out, no mutation
    let err = f.reconciler.reconcile("B1", at(10, 0, 5)).await.unwrap_err();
    match err {
        ScanError::TooSoon { wait_secs } => assert_eq!(wait_secs, 5),
        other => panic!("expected TooSoon, got {other:?}"),
    }
    assert!(f.store.sessions().await[0].is_open());

    // 10:00:15 — clock out, elapsed 15s
    let recorded = f.reconciler.reconcile("B1", at(10, 0, 15)).await.unwrap();
    assert_eq!(recorded.action, ScanAction::ClockOut);
    let hours = recorded.attendance.total_hours.unwrap();
    assert!((hours - 15.0 / 3600.0).abs() < 1e-6);

    let sessions = f.store.sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].clock_out, Some(at(10, 0, 15)));
}

#[tokio::test]
async fn minimum_duration_boundary() {
    let f = fixture();
    f.reconciler.reconcile("B1", at(10, 0, 0)).await.unwrap();

    // One second short of the minimum
    let err = f.reconciler.reconcile("B1", at(10, 0, 9)).await.unwrap_err();
    match err {
        ScanError::TooSoon { wait_secs } => assert_eq!(wait_secs, 1),
        other => panic!("expected TooSoon, got {other:?}"),
    }

    // Exactly the minimum is accepted
    let recorded = f.reconciler.reconcile("B1", at(10, 0, 10)).await.unwrap();
    assert_eq!(recorded.action, ScanAction::ClockOut);
}

#[tokio::test]
async fn too_soon_leaves_no_trace() {
    let f = fixture();
    f.reconciler.reconcile("B1", at(10, 0, 0)).await.unwrap();

    let mut rx = f.broadcaster.subscribe();
    let log_before = f.store.scan_log().await.len();

    let err = f.reconciler.reconcile("B1", at(10, 0, 5)).await.unwrap_err();
    assert!(matches!(err, ScanError::TooSoon { .. }));

    // No broadcast, no log entry, session untouched
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(f.store.scan_log().await.len(), log_before);
    assert!(f.store.sessions().await[0].is_open());
}

#[tokio::test]
async fn duplicate_clock_out_is_debounced() {
    let f = fixture();
    f.reconciler.reconcile("B1", at(10, 0, 0)).await.unwrap();

    // A concurrent duplicate already got its clock-out accepted one second
    // ago; this delivery must bounce even though the duration guard passes.
    f.debouncer.record(1, ScanAction::ClockOut, at(10, 0, 14));

    let err = f.reconciler.reconcile("B1", at(10, 0, 15)).await.unwrap_err();
    assert!(matches!(err, ScanError::TooFrequent));

    // Exactly one state mutation so far: the open session from the clock-in.
    let sessions = f.store.sessions().await;
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].is_open());
    assert_eq!(f.store.scan_log().await.len(), 1);
}

#[tokio::test]
async fn duplicate_clock_in_is_debounced() {
    let f = fixture();

    f.debouncer.record(1, ScanAction::ClockIn, at(9, 59, 59));

    let err = f.reconciler.reconcile("B1", at(10, 0, 0)).await.unwrap_err();
    assert!(matches!(err, ScanError::TooFrequent));
    assert!(f.store.sessions().await.is_empty());
    assert!(f.store.scan_log().await.is_empty());
}

#[tokio::test]
async fn debounce_entry_expires() {
    let f = fixture();

    // Entry older than the window never blocks.
    f.debouncer.record(1, ScanAction::ClockIn, at(9, 59, 0));

    let recorded = f.reconciler.reconcile("B1", at(10, 0, 0)).await.unwrap();
    assert_eq!(recorded.action, ScanAction::ClockIn);
}

#[tokio::test]
async fn scenario_b_unassigned_badge() {
    let f = fixture();
    let mut rx = f.broadcaster.subscribe();

    let err = f.reconciler.reconcile("B9", at(11, 0, 0)).await.unwrap_err();
    match err {
        ScanError::UnknownBadge { nfc_card_id } => assert_eq!(nfc_card_id, "B9"),
        other => panic!("expected UnknownBadge, got {other:?}"),
    }

    // One audit entry, one broadcast, zero session mutations
    let log = f.store.scan_log().await;
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].action, ScanAction::Unassigned);
    assert_eq!(log[0].employee_id, None);
    assert_eq!(log[0].nfc_card_id, "B9");

    match rx.recv().await.unwrap() {
        AttendanceEvent::NfcUnassigned { nfc_card_id, scan_time } => {
            assert_eq!(nfc_card_id, "B9");
            assert_eq!(scan_time, at(11, 0, 0));
        }
        other => panic!("expected NfcUnassigned, got {other:?}"),
    }
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    assert!(f.store.sessions().await.is_empty());
}

#[tokio::test]
async fn success_broadcasts_exactly_once() {
    let f = fixture();
    let mut rx = f.broadcaster.subscribe();

    f.reconciler.reconcile("B1", at(10, 0, 0)).await.unwrap();

    match rx.recv().await.unwrap() {
        AttendanceEvent::AttendanceRecorded {
            employee,
            attendance,
            action,
            scan_time,
        } => {
            assert_eq!(employee.id, 1);
            assert_eq!(action, ScanAction::ClockIn);
            assert!(attendance.is_open());
            assert_eq!(scan_time, at(10, 0, 0));
        }
        other => panic!("expected AttendanceRecorded, got {other:?}"),
    }
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn multiple_cycles_in_one_day() {
    let f = fixture();

    f.reconciler.reconcile("B1", at(9, 0, 0)).await.unwrap();
    f.reconciler.reconcile("B1", at(12, 0, 0)).await.unwrap();
    f.reconciler.reconcile("B1", at(13, 0, 0)).await.unwrap();
    let recorded = f.reconciler.reconcile("B1", at(17, 30, 0)).await.unwrap();

    assert_eq!(recorded.action, ScanAction::ClockOut);
    assert!((recorded.attendance.total_hours.unwrap() - 4.5).abs() < 1e-6);

    // Two closed cycles, never two open at once
    let sessions = f.store.sessions().await;
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| !s.is_open()));
}

#[tokio::test]
async fn scenario_c_invalid_edit_writes_nothing() {
    let f = fixture();
    let recorded = f.reconciler.reconcile("B1", at(9, 0, 0)).await.unwrap();

    let err = f
        .store
        .edit_session(
            recorded.attendance.id,
            SessionEdit {
                clock_in: Some(at(17, 0, 0)),
                clock_out: Some(at(9, 30, 0)),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidRange));

    let sessions = f.store.sessions().await;
    assert_eq!(sessions[0].clock_in, at(9, 0, 0));
    assert_eq!(sessions[0].clock_out, None);
}

#[tokio::test]
async fn reporting_offset_buckets_the_date() {
    let policy = ScanPolicy {
        reporting_offset: FixedOffset::east_opt(6 * 3600).unwrap(),
        ..ScanPolicy::default()
    };

    // 20:00 UTC on the 29th is already the 30th at UTC+6.
    let late_evening = Utc.with_ymd_and_hms(2026, 8, 29, 20, 0, 0).unwrap();
    assert_eq!(
        policy.bucket_date(late_evening),
        NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()
    );
}

/// Store wrapper that loses the first create to a simulated racing scan.
struct RacySessionStore {
    inner: InMemorySessionStore,
    fail_next_create: AtomicBool,
}

#[async_trait]
impl SessionStore for RacySessionStore {
    async fn resolve_employee_by_badge(
        &self,
        badge_id: &str,
    ) -> Result<Option<Employee>, StoreError> {
        self.inner.resolve_employee_by_badge(badge_id).await
    }

    async fn find_open_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceSession>, StoreError> {
        self.inner.find_open_session(employee_id, date).await
    }

    async fn create_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
        clock_in: DateTime<Utc>,
    ) -> Result<AttendanceSession, StoreError> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(StoreError::ConflictingOpenSession);
        }
        self.inner.create_session(employee_id, date, clock_in).await
    }

    async fn close_session(
        &self,
        session_id: u64,
        clock_out: DateTime<Utc>,
        total_hours: f64,
    ) -> Result<AttendanceSession, StoreError> {
        self.inner.close_session(session_id, clock_out, total_hours).await
    }

    async fn edit_session(
        &self,
        session_id: u64,
        edit: SessionEdit,
    ) -> Result<AttendanceSession, StoreError> {
        self.inner.edit_session(session_id, edit).await
    }

    async fn append_scan_log(&self, entry: ScanLogEntry) -> Result<(), StoreError> {
        self.inner.append_scan_log(entry).await
    }
}

#[tokio::test]
async fn scenario_d_lost_create_race_is_re_read() {
    let store = Arc::new(RacySessionStore {
        inner: InMemorySessionStore::with_employees(vec![employee(1, "B1")]),
        fail_next_create: AtomicBool::new(true),
    });
    let policy = ScanPolicy::default();
    let reconciler = ScanReconciler::new(
        store.clone(),
        ScanDebouncer::new(policy.debounce_window_secs, policy.debounce_ttl_secs),
        Broadcaster::new(16),
        policy,
    );

    // The first create collides with the "other" scan; the re-read finds no
    // open session (the racer already closed or never committed here) and
    // the retry lands cleanly. Exactly one open session results.
    let recorded = reconciler.reconcile("B1", at(10, 0, 0)).await.unwrap();
    assert_eq!(recorded.action, ScanAction::ClockIn);

    let sessions = store.inner.sessions().await;
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].is_open());
}
