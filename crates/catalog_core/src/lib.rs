//! Course catalog core: category forest, course ordering and the category
//! reorder engine.
//! This crate is the single source of truth for catalog ordering invariants.

pub mod access;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod reorder;
pub mod repo;
pub mod service;

pub use access::{
    parse_catalog_capability, ActorId, AllowAll, CapabilityError, CapabilityGate,
    CapabilityTable, CatalogCapability,
};
pub use config::{ConfigError, ReorderConfig, DEFAULT_SORT_GAP};
pub use error::ErrorKind;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::{
    Category, CategoryFilter, CategoryId, CategoryPage, CategoryQuery, CategoryTreeNode,
    DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, ROOT_CATEGORY_ID,
};
pub use model::course::{Course, CourseId};
pub use reorder::{
    DeleteOutcome, DeleteRequest, MoveOutcome, MoveRequest, ReorderEngine, ReorderError,
    MOVE_TO_END,
};
pub use repo::{
    CatalogStore, CategoryStore, CourseStore, SqliteCatalogStore, SqliteUnitOfWork, StoreError,
    StoreResult, UnitOfWork,
};
pub use service::category_service::{CategoryService, CategoryServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
