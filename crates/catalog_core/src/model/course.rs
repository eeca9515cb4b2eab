//! Course model.

use crate::model::category::CategoryId;
use serde::Serialize;

/// Stable course identifier.
pub type CourseId = i64;

/// Course row owned by exactly one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: CourseId,
    /// Owning category.
    pub category: CategoryId,
    pub full_name: String,
    pub short_name: String,
    /// Order key, `category.sort_order + local_index + 1` once cascaded.
    pub sort_order: i64,
    pub visible: bool,
    /// Epoch seconds of the last write.
    pub time_modified: i64,
}
