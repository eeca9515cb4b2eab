//! Category reordering and sort-key rebalancing.
//!
//! # Responsibility
//! - Validate a move request against the current forest.
//! - Compute the new sibling order, renumber sibling keys and cascade the
//!   new keys into each affected category's courses.
//!
//! # Invariants
//! - After a successful move, siblings under the target parent carry keys
//!   `gap, 2 * gap, ..., n * gap` in their new order.
//! - Courses of every category whose key changed carry
//!   `category_key + local_index + 1`, relative order preserved.
//! - A move writes only `parent` and `sort_order` columns; no row is created
//!   or deleted. Deletion relocates content before removing category rows.
//! - The engine never commits: all writes go through the caller's unit of
//!   work, so any error leaves the catalog untouched once the unit is dropped.

use crate::config::{ConfigError, ReorderConfig};
use crate::error::ErrorKind;
use crate::model::category::{CategoryId, ROOT_CATEGORY_ID};
use crate::repo::{CategoryStore, CourseStore, StoreError};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod cascade;
pub mod delete;
pub mod renumber;
pub mod siblings;

pub use cascade::{
    cascade_course_keys, plan_course_keys, rank_courses, sequence_course_keys,
    CourseKeyAssignment,
};
pub use delete::{validate_delete_request, DeleteOutcome, DeleteRequest};
pub use renumber::{renumber, SortKeyAssignment};
pub use siblings::{reorder_siblings, MOVE_TO_END};

/// Request to move one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    /// Category to move.
    pub category_id: CategoryId,
    /// Sibling to move toward, or [`MOVE_TO_END`].
    pub before_id: CategoryId,
    /// New parent; `None` keeps the current one, `Some(0)` moves to root.
    pub new_parent: Option<CategoryId>,
}

impl MoveRequest {
    /// Moves `category_id` one step toward `before_id` under its current parent.
    pub fn toward(category_id: CategoryId, before_id: CategoryId) -> Self {
        Self {
            category_id,
            before_id,
            new_parent: None,
        }
    }

    /// Moves `category_id` to the end of its current sibling list.
    pub fn to_end(category_id: CategoryId) -> Self {
        Self::toward(category_id, MOVE_TO_END)
    }

    /// Sets the target parent.
    pub fn under(mut self, parent: CategoryId) -> Self {
        self.new_parent = Some(parent);
        self
    }
}

/// Result of a successful move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub category_id: CategoryId,
    pub previous_parent: CategoryId,
    pub parent: CategoryId,
    /// Zero-based index among the new siblings.
    pub position: usize,
    /// Key assigned to the moved category.
    pub sort_order: i64,
    /// Category rows whose key was rewritten.
    pub categories_renumbered: usize,
    /// Course rows whose key was rewritten.
    pub courses_renumbered: usize,
}

impl MoveOutcome {
    pub fn parent_changed(&self) -> bool {
        self.previous_parent != self.parent
    }
}

impl Display for MoveOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "category {} now under parent {} at position {} (sort order {})",
            self.category_id, self.parent, self.position, self.sort_order
        )
    }
}

/// Errors from the reorder engine.
#[derive(Debug)]
pub enum ReorderError {
    /// Category to move does not exist.
    CategoryNotFound(CategoryId),
    /// Requested new parent does not exist.
    ParentNotFound(CategoryId),
    /// `before_id` does not exist.
    BeforeNotFound(CategoryId),
    /// `before_id` lives under a different parent than the target.
    ParentMismatch {
        before_id: CategoryId,
        before_parent: CategoryId,
        target_parent: CategoryId,
    },
    /// A category cannot be its own parent.
    SelfParent(CategoryId),
    /// A category cannot be moved before itself.
    BeforeSelf(CategoryId),
    /// The new parent is a descendant of the moved category.
    CycleDetected {
        category_id: CategoryId,
        parent_id: CategoryId,
    },
    /// A category holds more courses than its gap leaves keys for.
    GapCapacityExceeded {
        category_id: CategoryId,
        course_count: usize,
        gap: i64,
    },
    /// A key for this category, or for one of its courses, exceeds `i64`.
    SortKeyOverflow { category_id: CategoryId },
    /// Delete request names no category.
    EmptyDeleteSet,
    /// Delete request names the same category twice.
    DuplicateDeleteId(CategoryId),
    /// Content target is itself being deleted.
    MoveTargetDeleted(CategoryId),
    /// Content target does not exist.
    MoveTargetNotFound(CategoryId),
    /// Content target sits below a category being deleted.
    MoveTargetInsideDeleted {
        target: CategoryId,
        deleted: CategoryId,
    },
    /// Deleting without a content target requires an empty category.
    CategoryNotEmpty {
        category_id: CategoryId,
        categories: usize,
        courses: usize,
    },
    /// Store failure, propagated unmodified.
    Store(StoreError),
}

impl ReorderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CategoryNotFound(_)
            | Self::ParentNotFound(_)
            | Self::BeforeNotFound(_)
            | Self::MoveTargetNotFound(_) => ErrorKind::NotFound,
            Self::ParentMismatch { .. }
            | Self::SelfParent(_)
            | Self::BeforeSelf(_)
            | Self::CycleDetected { .. }
            | Self::EmptyDeleteSet
            | Self::DuplicateDeleteId(_)
            | Self::MoveTargetDeleted(_)
            | Self::MoveTargetInsideDeleted { .. }
            | Self::CategoryNotEmpty { .. } => ErrorKind::InvalidOperation,
            Self::GapCapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::SortKeyOverflow { .. } => ErrorKind::KeyOverflow,
            Self::Store(_) => ErrorKind::Storage,
        }
    }
}

impl Display for ReorderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent category not found: {id}"),
            Self::BeforeNotFound(id) => write!(f, "before category not found: {id}"),
            Self::ParentMismatch {
                before_id,
                before_parent,
                target_parent,
            } => write!(
                f,
                "beforeid must share the target parent: category {before_id} is under {before_parent}, target parent is {target_parent}"
            ),
            Self::SelfParent(id) => write!(f, "category {id} cannot be its own parent"),
            Self::BeforeSelf(id) => write!(f, "category {id} cannot be moved before itself"),
            Self::CycleDetected {
                category_id,
                parent_id,
            } => write!(
                f,
                "move would create cycle: category {category_id} under descendant {parent_id}"
            ),
            Self::GapCapacityExceeded {
                category_id,
                course_count,
                gap,
            } => write!(
                f,
                "category {category_id} holds {course_count} courses; sort gap {gap} leaves room for {}",
                gap - 1
            ),
            Self::SortKeyOverflow { category_id } => write!(
                f,
                "sort key for category {category_id} or its courses exceeds the i64 range"
            ),
            Self::EmptyDeleteSet => write!(f, "categoryids must name at least one category"),
            Self::DuplicateDeleteId(id) => write!(f, "categoryids contains {id} more than once"),
            Self::MoveTargetDeleted(id) => {
                write!(f, "movetoid {id} is in the set of categories being deleted")
            }
            Self::MoveTargetNotFound(id) => write!(f, "movetoid category not found: {id}"),
            Self::MoveTargetInsideDeleted { target, deleted } => write!(
                f,
                "movetoid {target} sits below category {deleted}, which is being deleted"
            ),
            Self::CategoryNotEmpty {
                category_id,
                categories,
                courses,
            } => write!(
                f,
                "category {category_id} still holds {categories} categories and {courses} courses; pass movetoid"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReorderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ReorderError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Move orchestrator over caller-supplied store ports.
#[derive(Debug, Clone, Copy)]
pub struct ReorderEngine {
    config: ReorderConfig,
}

impl ReorderEngine {
    /// Creates an engine from a validated config.
    pub fn new(config: ReorderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReorderConfig {
        &self.config
    }

    /// Applies one move through the given ports.
    ///
    /// Both ports must belong to the same open unit of work; the caller
    /// commits on `Ok` and drops (rolls back) on `Err`.
    pub fn apply<C, K>(
        &self,
        categories: &C,
        courses: &K,
        request: &MoveRequest,
    ) -> Result<MoveOutcome, ReorderError>
    where
        C: CategoryStore + ?Sized,
        K: CourseStore + ?Sized,
    {
        let MoveRequest {
            category_id,
            before_id,
            new_parent,
        } = *request;
        let gap = self.config.sort_gap;

        let category = categories
            .get(category_id)?
            .ok_or(ReorderError::CategoryNotFound(category_id))?;
        let target_parent = new_parent.unwrap_or(category.parent);

        if new_parent == Some(category_id) {
            return Err(ReorderError::SelfParent(category_id));
        }
        if before_id != MOVE_TO_END && before_id == category_id {
            return Err(ReorderError::BeforeSelf(category_id));
        }

        if new_parent.is_some() && target_parent != ROOT_CATEGORY_ID {
            categories
                .get(target_parent)?
                .ok_or(ReorderError::ParentNotFound(target_parent))?;
            if self.config.strict_ancestry {
                ensure_not_descendant(categories, category_id, target_parent)?;
            }
        }

        if before_id != MOVE_TO_END {
            let before = categories
                .get(before_id)?
                .ok_or(ReorderError::BeforeNotFound(before_id))?;
            if before.parent != target_parent {
                return Err(ReorderError::ParentMismatch {
                    before_id,
                    before_parent: before.parent,
                    target_parent,
                });
            }
        }

        let siblings = categories.list_children(target_parent)?;
        let sibling_ids: Vec<CategoryId> = siblings.iter().map(|sibling| sibling.id).collect();
        let new_order = reorder_siblings(&sibling_ids, category_id, before_id);

        if target_parent != category.parent {
            categories.set_parent(category_id, target_parent)?;
        }

        let mut previous_keys: HashMap<CategoryId, i64> = siblings
            .iter()
            .map(|sibling| (sibling.id, sibling.sort_order))
            .collect();
        previous_keys.insert(category_id, category.sort_order);
        let ordered: Vec<(CategoryId, i64)> = new_order
            .iter()
            .filter_map(|id| previous_keys.get(id).map(|key| (*id, *key)))
            .collect();

        let plan = renumber(&ordered, gap)?;
        let changed: Vec<SortKeyAssignment> = plan
            .iter()
            .copied()
            .filter(SortKeyAssignment::is_changed)
            .collect();
        for assignment in &changed {
            categories.set_sort_order(assignment.category_id, assignment.assigned)?;
        }

        let mut courses_renumbered = 0;
        for assignment in &changed {
            courses_renumbered +=
                cascade_course_keys(courses, assignment.category_id, assignment.assigned, gap)?;
        }

        let (position, moved) = plan
            .iter()
            .enumerate()
            .find(|(_, assignment)| assignment.category_id == category_id)
            .ok_or_else(|| {
                ReorderError::Store(StoreError::InvalidData(format!(
                    "category {category_id} missing from renumbered sibling list"
                )))
            })?;

        debug!(
            "event=category_reorder module=reorder status=ok category_id={category_id} parent={target_parent} position={position} siblings={} categories_renumbered={} courses_renumbered={courses_renumbered}",
            plan.len(),
            changed.len()
        );

        Ok(MoveOutcome {
            category_id,
            previous_parent: category.parent,
            parent: target_parent,
            position,
            sort_order: moved.assigned,
            categories_renumbered: changed.len(),
            courses_renumbered,
        })
    }
}

fn ensure_not_descendant<C: CategoryStore + ?Sized>(
    categories: &C,
    category_id: CategoryId,
    candidate_parent: CategoryId,
) -> Result<(), ReorderError> {
    let mut visited = HashSet::new();
    let mut cursor = candidate_parent;
    while cursor != ROOT_CATEGORY_ID {
        if cursor == category_id || !visited.insert(cursor) {
            return Err(ReorderError::CycleDetected {
                category_id,
                parent_id: candidate_parent,
            });
        }
        cursor = categories
            .get(cursor)?
            .ok_or(ReorderError::ParentNotFound(cursor))?
            .parent;
    }
    Ok(())
}
