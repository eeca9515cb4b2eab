//! Connection bootstrap for catalog databases.
//!
//! # Invariants
//! - Returned connections enforce `courses.category` foreign keys.
//! - Returned connections wait on a busy database instead of failing fast, so
//!   an `IMMEDIATE` unit of work queues behind a competing writer.
//! - Returned connections are at [`latest_version`](super::migrations::latest_version).

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a catalog database file and migrates it.
///
/// # Side effects
/// - Emits `db_open` logging events with duration, schema versions and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Opens a private in-memory catalog, used by tests and dry runs.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = connect()
        .map_err(|source| DbError::Open { mode, source })
        .and_then(|mut conn| {
            let (from, to) = bootstrap_connection(&mut conn)?;
            Ok((conn, from, to))
        });

    match result {
        Ok((conn, from, to)) => {
            info!(
                "event=db_open module=db status=ok mode={mode} schema_from={from} schema_to={to} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code={} error={err}",
                started_at.elapsed().as_millis(),
                err.code()
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<(u32, u32)> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|source| DbError::Configure {
            setting: "foreign_keys",
            source,
        })?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|source| DbError::Configure {
            setting: "busy_timeout",
            source,
        })?;
    let report = apply_migrations(conn)?;
    Ok((report.from, report.to))
}
