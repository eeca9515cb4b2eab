//! Ordered catalog schema scripts.
//!
//! # Invariants
//! - Script versions are strictly increasing and never renumbered.
//! - Each script runs in its own transaction together with its
//!   `PRAGMA user_version` stamp, so a failure names the script and keeps
//!   every earlier script applied.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "0001_categories",
        sql: include_str!("0001_categories.sql"),
    },
    Migration {
        version: 2,
        name: "0002_courses",
        sql: include_str!("0002_courses.sql"),
    },
    Migration {
        version: 3,
        name: "0003_category_listing_index",
        sql: include_str!("0003_category_listing_index.sql"),
    },
];

/// Schema versions before and after one [`apply_migrations`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from: u32,
    pub to: u32,
    /// Names of the scripts run by this call, in order.
    pub applied: Vec<&'static str>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Highest schema version this build can create.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the catalog schema on `conn` up to [`latest_version`].
///
/// # Errors
/// - [`DbError::SchemaTooNew`] when the file is ahead of this build.
/// - [`DbError::Migration`] naming the first script that failed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    let from = current_user_version(conn)?;
    let supported = latest_version();
    if from > supported {
        return Err(DbError::SchemaTooNew {
            found: from,
            supported,
        });
    }

    let mut report = MigrationReport {
        from,
        to: from,
        applied: Vec::new(),
    };
    for migration in MIGRATIONS.iter().filter(|migration| migration.version > from) {
        run_migration(conn, migration).map_err(|source| DbError::Migration {
            version: migration.version,
            name: migration.name,
            source,
        })?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
        report.to = migration.version;
        report.applied.push(migration.name);
    }
    Ok(report)
}

fn run_migration(conn: &mut Connection, migration: &Migration) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(migration.sql)?;
    tx.pragma_update(None, "user_version", migration.version)?;
    tx.commit()
}

/// Schema version currently stamped on the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
