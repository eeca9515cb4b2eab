//! Repository ports and SQLite persistence implementations.
//!
//! # Responsibility
//! - Define the store contracts the reorder engine consumes.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Every store call made on behalf of one move runs inside the same
//!   [`UnitOfWork`]; dropping a unit without committing rolls it back.
//! - Listings are deterministic: `sortorder ASC, id ASC`.

use crate::db::DbError;
use crate::model::category::CategoryId;
use crate::model::course::CourseId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod catalog_store;
pub mod category_repo;
pub mod course_repo;
mod schema;

pub use catalog_store::{CatalogStore, SqliteCatalogStore, SqliteUnitOfWork, UnitOfWork};
pub use category_repo::CategoryStore;
pub use course_repo::CourseStore;

/// Result type used by store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from catalog store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// A write targeted a category row that does not exist.
    CategoryNotFound(CategoryId),
    /// A write targeted a course row that does not exist.
    CourseNotFound(CourseId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::CategoryNotFound(id) => write!(f, "category row not found: {id}"),
            Self::CourseNotFound(id) => write!(f, "course row not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "catalog store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "catalog store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid catalog data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
