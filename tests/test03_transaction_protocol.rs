//! Drives the facade against a scripted in-memory driver and checks the exact order of
//! driver calls: acquisition, auto-commit toggles, statement lifetime, commit/rollback
//! and release.

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sql_facade::prelude::*;
use sql_facade::{ParameterSink, transaction::run_in_transaction};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Acquired,
    AutoCommit(bool),
    Prepared(String),
    Bound(usize, String),
    Executed,
    BatchAdded,
    BatchExecuted(usize),
    StatementClosed,
    Commit,
    Rollback,
    Released,
}

#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    acquire: bool,
    disable_auto_commit: bool,
    enable_auto_commit: bool,
    execute: bool,
    commit: bool,
    rollback: bool,
}

#[derive(Debug, Default)]
struct Script {
    events: Vec<Event>,
    faults: Faults,
}

#[derive(Debug, Clone, Default)]
struct MockProvider {
    script: Arc<Mutex<Script>>,
}

impl MockProvider {
    fn with_faults(faults: Faults) -> Self {
        let provider = Self::default();
        provider.script.lock().unwrap().faults = faults;
        provider
    }

    fn events(&self) -> Vec<Event> {
        self.script.lock().unwrap().events.clone()
    }
}

fn log(script: &Arc<Mutex<Script>>, event: Event) {
    script.lock().unwrap().events.push(event);
}

fn faults(script: &Arc<Mutex<Script>>) -> Faults {
    script.lock().unwrap().faults
}

impl ConnectionProvider for MockProvider {
    type Connection = MockConnection;

    fn acquire(&self) -> Result<MockConnection, SqlFacadeError> {
        if faults(&self.script).acquire {
            return Err(SqlFacadeError::ConnectionError("pool exhausted".into()));
        }
        log(&self.script, Event::Acquired);
        Ok(MockConnection {
            script: Arc::clone(&self.script),
            auto_commit: true,
        })
    }
}

#[derive(Debug)]
struct MockConnection {
    script: Arc<Mutex<Script>>,
    auto_commit: bool,
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        log(&self.script, Event::Released);
    }
}

impl DbConnection for MockConnection {
    type Statement<'c> = MockStatement<'c>;

    fn prepare(&mut self, sql: &str, _keys: KeyMode) -> Result<MockStatement<'_>, SqlFacadeError> {
        log(&self.script, Event::Prepared(sql.to_string()));
        Ok(MockStatement {
            conn: self,
            pending: 0,
        })
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), SqlFacadeError> {
        let faults = faults(&self.script);
        if !enabled && faults.disable_auto_commit {
            return Err(SqlFacadeError::ConnectionError("read-only session".into()));
        }
        if enabled && faults.enable_auto_commit {
            return Err(SqlFacadeError::ConnectionError("session reset refused".into()));
        }
        log(&self.script, Event::AutoCommit(enabled));
        self.auto_commit = enabled;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqlFacadeError> {
        if faults(&self.script).commit {
            return Err(SqlFacadeError::ExecutionError("commit refused".into()));
        }
        log(&self.script, Event::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlFacadeError> {
        if faults(&self.script).rollback {
            return Err(SqlFacadeError::ConnectionError("link down".into()));
        }
        log(&self.script, Event::Rollback);
        Ok(())
    }
}

#[derive(Debug)]
struct MockStatement<'c> {
    conn: &'c mut MockConnection,
    pending: usize,
}

impl MockStatement<'_> {
    fn bound(&mut self, index: usize, what: impl Into<String>) -> Result<(), SqlFacadeError> {
        log(&self.conn.script, Event::Bound(index, what.into()));
        Ok(())
    }

    fn execute(&mut self) -> Result<(), SqlFacadeError> {
        if faults(&self.conn.script).execute {
            return Err(SqlFacadeError::ExecutionError("constraint violated".into()));
        }
        log(&self.conn.script, Event::Executed);
        Ok(())
    }
}

impl Drop for MockStatement<'_> {
    fn drop(&mut self) {
        log(&self.conn.script, Event::StatementClosed);
    }
}

impl ParameterSink for MockStatement<'_> {
    fn bind_double(&mut self, index: usize, value: f64) -> Result<(), SqlFacadeError> {
        self.bound(index, value.to_string())
    }
    fn bind_int(&mut self, index: usize, value: i32) -> Result<(), SqlFacadeError> {
        self.bound(index, value.to_string())
    }
    fn bind_float(&mut self, index: usize, value: f32) -> Result<(), SqlFacadeError> {
        self.bound(index, value.to_string())
    }
    fn bind_string(&mut self, index: usize, value: &str) -> Result<(), SqlFacadeError> {
        self.bound(index, value)
    }
    fn bind_date(&mut self, index: usize, value: NaiveDate) -> Result<(), SqlFacadeError> {
        self.bound(index, value.to_string())
    }
    fn bind_boolean(&mut self, index: usize, value: bool) -> Result<(), SqlFacadeError> {
        self.bound(index, value.to_string())
    }
    fn bind_bytes(&mut self, index: usize, value: &[u8]) -> Result<(), SqlFacadeError> {
        self.bound(index, format!("{value:?}"))
    }
    fn bind_timestamp(&mut self, index: usize, value: NaiveDateTime) -> Result<(), SqlFacadeError> {
        self.bound(index, value.to_string())
    }
    fn bind_array(&mut self, index: usize, value: &SqlArray) -> Result<(), SqlFacadeError> {
        self.bound(index, format!("array({})", value.base_type))
    }
    fn bind_decimal(&mut self, index: usize, value: &Decimal) -> Result<(), SqlFacadeError> {
        self.bound(index, value.to_string())
    }
    fn bind_long(&mut self, index: usize, value: i64) -> Result<(), SqlFacadeError> {
        self.bound(index, value.to_string())
    }
    fn bind_time(&mut self, index: usize, value: NaiveTime) -> Result<(), SqlFacadeError> {
        self.bound(index, value.to_string())
    }
    fn bind_clob(&mut self, index: usize, value: &Clob) -> Result<(), SqlFacadeError> {
        self.bound(index, value.as_str())
    }
    fn bind_blob(&mut self, index: usize, _value: &Blob) -> Result<(), SqlFacadeError> {
        self.bound(index, "blob")
    }
    fn bind_null(&mut self, index: usize, sql_type: i32) -> Result<(), SqlFacadeError> {
        self.bound(index, format!("null:{sql_type}"))
    }
    fn bind_object(&mut self, index: usize, value: Option<&JsonValue>) -> Result<(), SqlFacadeError> {
        match value {
            Some(v) => self.bound(index, v.to_string()),
            None => self.bound(index, "absent"),
        }
    }
}

impl PreparedStatement for MockStatement<'_> {
    fn execute_query(&mut self) -> Result<ResultSnapshot, SqlFacadeError> {
        self.execute()?;
        let mut snapshot = ResultSnapshot::new(vec!["n".to_string()]);
        snapshot.push_row(vec![SqlValue::Integer(1)]);
        Ok(snapshot)
    }

    fn execute_update(&mut self) -> Result<u64, SqlFacadeError> {
        self.execute()?;
        Ok(1)
    }

    fn generated_keys(&mut self) -> Result<ResultSnapshot, SqlFacadeError> {
        Ok(ResultSnapshot::new(vec!["generated_key".to_string()]))
    }

    fn add_batch(&mut self) -> Result<(), SqlFacadeError> {
        self.pending += 1;
        log(&self.conn.script, Event::BatchAdded);
        Ok(())
    }

    fn execute_batch(&mut self) -> Result<Vec<u64>, SqlFacadeError> {
        self.execute()?;
        let entries = std::mem::take(&mut self.pending);
        log(&self.conn.script, Event::BatchExecuted(entries));
        Ok(vec![1; entries])
    }
}

const UPDATE: &str = "UPDATE t SET x = ?";

fn bound(index: usize, what: &str) -> Event {
    Event::Bound(index, what.to_string())
}

#[test]
fn committed_unit_of_work_follows_the_protocol() {
    let provider = MockProvider::default();
    let db = Database::new(provider.clone());

    let value = db
        .execute_return_transaction(|conn| {
            execute_update(conn, UPDATE, &params![5])?;
            Ok("done")
        })
        .unwrap();

    assert_eq!(value, "done");
    assert_eq!(
        provider.events(),
        vec![
            Event::Acquired,
            Event::AutoCommit(false),
            Event::Prepared(UPDATE.into()),
            bound(1, "5"),
            Event::Executed,
            Event::StatementClosed,
            Event::Commit,
            Event::AutoCommit(true),
            Event::Released,
        ]
    );
}

#[test]
fn failed_unit_of_work_rolls_back_and_keeps_its_error() {
    let provider = MockProvider::with_faults(Faults {
        execute: true,
        ..Faults::default()
    });
    let db = Database::new(provider.clone());

    let err = db
        .execute_void_transaction(|conn| {
            execute_update(conn, UPDATE, &params!["a"])?;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(err, SqlFacadeError::ExecutionError(ref m) if m == "constraint violated"));
    let events = provider.events();
    assert!(!events.contains(&Event::Commit));
    assert_eq!(
        &events[events.len() - 4..],
        &[
            Event::StatementClosed,
            Event::Rollback,
            Event::AutoCommit(true),
            Event::Released,
        ]
    );
}

#[test]
fn commit_failure_triggers_rollback() {
    let provider = MockProvider::with_faults(Faults {
        commit: true,
        ..Faults::default()
    });
    let db = Database::new(provider.clone());

    let err = db.execute_void_transaction(|_conn| Ok(())).unwrap_err();

    assert!(matches!(err, SqlFacadeError::ExecutionError(ref m) if m == "commit refused"));
    assert_eq!(
        provider.events(),
        vec![
            Event::Acquired,
            Event::AutoCommit(false),
            Event::Rollback,
            Event::AutoCommit(true),
            Event::Released,
        ]
    );
}

#[test]
fn rollback_failure_still_restores_auto_commit() {
    let provider = MockProvider::with_faults(Faults {
        rollback: true,
        ..Faults::default()
    });
    let db = Database::new(provider.clone());

    let err = db
        .execute_void_transaction(|_conn| Err(UnitOfWorkError::other("business rule")))
        .unwrap_err();

    match &err {
        SqlFacadeError::RollbackFailed { original, source } => {
            assert!(matches!(**original, SqlFacadeError::Transaction { ref message, .. } if message == "business rule"));
            assert!(source.is_connectivity());
        }
        other => panic!("expected a failed rollback, got {other:?}"),
    }
    assert_eq!(
        provider.events(),
        vec![
            Event::Acquired,
            Event::AutoCommit(false),
            Event::AutoCommit(true),
            Event::Released,
        ]
    );
}

#[test]
fn acquire_failure_runs_nothing() {
    let provider = MockProvider::with_faults(Faults {
        acquire: true,
        ..Faults::default()
    });
    let db = Database::new(provider.clone());
    let mut ran = false;

    let err = db
        .execute_void_transaction(|_conn| {
            ran = true;
            Ok(())
        })
        .unwrap_err();

    assert!(err.is_connectivity());
    assert!(!ran);
    assert!(provider.events().is_empty());
}

#[test]
fn auto_commit_refusal_runs_nothing() {
    let provider = MockProvider::with_faults(Faults {
        disable_auto_commit: true,
        ..Faults::default()
    });
    let db = Database::new(provider.clone());
    let mut ran = false;

    let err = db
        .execute_void_transaction(|_conn| {
            ran = true;
            Ok(())
        })
        .unwrap_err();

    assert!(err.is_connectivity());
    assert!(!ran);
    assert_eq!(provider.events(), vec![Event::Acquired, Event::Released]);
}

#[test]
fn query_releases_connection_before_processor_runs() {
    let provider = MockProvider::default();
    let db = Database::new(provider.clone());

    let seen_at_processing = db
        .execute_query(
            "SELECT COUNT(*) AS n FROM t WHERE x = ?",
            |rows| {
                assert_eq!(rows.first().and_then(|r| r.get("n")), Some(&SqlValue::Integer(1)));
                Ok(provider.events())
            },
            &params![true],
        )
        .unwrap();

    assert_eq!(
        seen_at_processing,
        vec![
            Event::Acquired,
            Event::Prepared("SELECT COUNT(*) AS n FROM t WHERE x = ?".into()),
            bound(1, "true"),
            Event::Executed,
            Event::StatementClosed,
            Event::Released,
        ]
    );
}

#[test]
fn batch_binds_each_entry_in_order() {
    let provider = MockProvider::default();
    let db = Database::new(provider.clone());
    let batch = vec![params!["p1", 1], params!["p2", 2]];

    let counts = db
        .execute_return_transaction(|conn| Ok(db.db_execute_batch_update(conn, UPDATE, &batch)?))
        .unwrap();

    assert_eq!(counts, vec![1, 1]);
    assert_eq!(
        provider.events(),
        vec![
            Event::Acquired,
            Event::AutoCommit(false),
            Event::Prepared(UPDATE.into()),
            bound(1, "p1"),
            bound(2, "1"),
            Event::BatchAdded,
            bound(1, "p2"),
            bound(2, "2"),
            Event::BatchAdded,
            Event::Executed,
            Event::BatchExecuted(2),
            Event::StatementClosed,
            Event::Commit,
            Event::AutoCommit(true),
            Event::Released,
        ]
    );
}

#[test]
fn panic_in_unit_of_work_rolls_back_during_unwind() {
    let provider = MockProvider::default();
    let db = Database::new(provider.clone());

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        db.execute_void_transaction(|_conn| panic!("bug in unit of work"))
    }));

    assert!(outcome.is_err());
    assert_eq!(
        provider.events(),
        vec![
            Event::Acquired,
            Event::AutoCommit(false),
            Event::Rollback,
            Event::AutoCommit(true),
            Event::Released,
        ]
    );
}

#[test]
fn supplied_connection_scope_leaves_connection_open() {
    let provider = MockProvider::default();
    let mut conn = provider.acquire().unwrap();

    run_in_transaction(&mut conn, |c| {
        execute_update(c, UPDATE, &[SqlParam::Null(NullParam::new(sql_type::INTEGER))])?;
        Ok(())
    })
    .unwrap();

    assert!(conn.auto_commit());
    assert!(!provider.events().contains(&Event::Released));
    assert!(provider.events().contains(&bound(1, "null:4")));
    drop(conn);
    assert_eq!(provider.events().last(), Some(&Event::Released));
}

#[test]
fn auto_commit_restore_failure_is_reported_with_the_original_error() {
    let provider = MockProvider::with_faults(Faults {
        enable_auto_commit: true,
        ..Faults::default()
    });
    let db = Database::new(provider.clone());

    let err = db
        .execute_void_transaction(|_conn| Err(UnitOfWorkError::other("business rule")))
        .unwrap_err();

    match &err {
        SqlFacadeError::AutoCommitNotRestored { original, source } => {
            assert!(matches!(**original, SqlFacadeError::Transaction { ref message, .. } if message == "business rule"));
            assert!(source.to_string().contains("session reset refused"));
        }
        other => panic!("expected the restore failure to be reported, got {other:?}"),
    }
    assert_eq!(
        provider.events(),
        vec![
            Event::Acquired,
            Event::AutoCommit(false),
            Event::Rollback,
            Event::Released,
        ]
    );
}

#[test]
fn failed_rollback_and_failed_restore_are_both_reported() {
    let provider = MockProvider::with_faults(Faults {
        rollback: true,
        enable_auto_commit: true,
        ..Faults::default()
    });
    let db = Database::new(provider.clone());

    let err = db
        .execute_void_transaction(|conn| {
            execute_update(conn, UPDATE, &params![1])?;
            Err(UnitOfWorkError::other("business rule"))
        })
        .unwrap_err();

    match &err {
        SqlFacadeError::AutoCommitNotRestored { original, .. } => {
            assert!(matches!(**original, SqlFacadeError::RollbackFailed { .. }));
        }
        other => panic!("expected nested cleanup failures, got {other:?}"),
    }
    assert!(matches!(err.original(), SqlFacadeError::Transaction { message, .. } if message == "business rule"));
    assert!(!provider.events().contains(&Event::Commit));
}
