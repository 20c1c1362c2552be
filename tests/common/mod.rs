#![allow(dead_code)]

use sql_facade::prelude::*;
use tempfile::TempDir;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const SCHEMA: &str = "
    CREATE TABLE t (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        score REAL
    );
    CREATE TABLE audit (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        label TEXT NOT NULL UNIQUE
    );
";

/// File-backed database in its own temp dir; keep the `TempDir` alive for the test.
pub fn temp_db() -> Result<(TempDir, Database<SqlitePool>), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("facade.db");
    let path = path.to_str().ok_or("temp path is not UTF-8")?;
    let db = Database::new(SqlitePool::open(path)?);
    db.get_connection()?.execute_script(SCHEMA)?;
    Ok((dir, db))
}

pub fn count_rows(db: &Database<SqlitePool>, table: &str) -> Result<i64, SqlFacadeError> {
    db.execute_query(
        &format!("SELECT COUNT(*) AS n FROM {table}"),
        |rows| {
            rows.first()
                .and_then(|row| row.get("n"))
                .and_then(SqlValue::as_int)
                .ok_or_else(|| SqlFacadeError::ExecutionError("COUNT(*) returned no row".into()))
        },
        &[],
    )
}

pub fn name_of(db: &Database<SqlitePool>, id: i64) -> Result<String, SqlFacadeError> {
    db.execute_query(
        "SELECT name FROM t WHERE id = ?",
        |rows| {
            Ok(rows
                .first()
                .and_then(|row| row.get("name"))
                .and_then(SqlValue::as_text)
                .unwrap_or("<none>")
                .to_string())
        },
        &params![id],
    )
}
