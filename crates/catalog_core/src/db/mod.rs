//! Catalog database bootstrap and schema versioning.
//!
//! # Responsibility
//! - Open catalog connections with the pragmas the stores rely on.
//! - Bring the `course_categories` and `courses` schema to the latest version.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - No store touches catalog rows on a connection these entry points did not
//!   fully migrate.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::MigrationReport;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Errors raised while opening or migrating a catalog database.
#[derive(Debug)]
pub enum DbError {
    /// SQLite could not open the file or memory database.
    Open {
        mode: &'static str,
        source: rusqlite::Error,
    },
    /// A connection pragma required by the stores was refused.
    Configure {
        setting: &'static str,
        source: rusqlite::Error,
    },
    /// The file was written by a newer catalog build.
    SchemaTooNew { found: u32, supported: u32 },
    /// One migration script failed; the schema stays at the previous version.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// Any other SQLite failure.
    Sqlite(rusqlite::Error),
}

impl DbError {
    /// Stable `error_code` value for log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Open { .. } => "db_open_failed",
            Self::Configure { .. } => "db_configure_failed",
            Self::SchemaTooNew { .. } => "db_schema_too_new",
            Self::Migration { .. } => "db_migration_failed",
            Self::Sqlite(_) => "db_sqlite_error",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { mode, source } => {
                write!(f, "cannot open {mode} catalog database: {source}")
            }
            Self::Configure { setting, source } => {
                write!(f, "cannot apply connection setting {setting}: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "catalog schema version {found} is newer than supported {supported}"
            ),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "catalog migration {version} ({name}) failed: {source}"),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. }
            | Self::Configure { source, .. }
            | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
