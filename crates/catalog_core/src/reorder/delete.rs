//! Category deletion with optional relocation of content.
//!
//! # Invariants
//! - Without a content target, only categories with no surviving child
//!   categories and no courses can be deleted.
//! - With a content target, surviving child categories are appended after the
//!   target's existing children and courses after the target's existing
//!   courses. Every key is rewritten through the renumber and cascade rules.

use crate::model::category::{Category, CategoryId, ROOT_CATEGORY_ID};
use crate::model::course::CourseId;
use crate::reorder::cascade::{cascade_course_keys, rank_courses, write_course_keys};
use crate::reorder::renumber::{renumber, SortKeyAssignment};
use crate::reorder::{ReorderEngine, ReorderError};
use crate::repo::{CategoryStore, CourseStore};
use log::debug;
use std::collections::HashSet;

/// Request to delete a set of categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub category_ids: Vec<CategoryId>,
    /// Receives child categories and courses of the deleted categories.
    pub move_to: Option<CategoryId>,
}

impl DeleteRequest {
    pub fn new(category_ids: impl IntoIterator<Item = CategoryId>) -> Self {
        Self {
            category_ids: category_ids.into_iter().collect(),
            move_to: None,
        }
    }

    /// Relocates content into `target` instead of refusing non-empty categories.
    pub fn moving_content_to(mut self, target: CategoryId) -> Self {
        self.move_to = Some(target);
        self
    }
}

/// Result of a successful delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: Vec<CategoryId>,
    pub move_to: Option<CategoryId>,
    pub categories_relocated: usize,
    pub courses_relocated: usize,
    pub categories_renumbered: usize,
    pub courses_renumbered: usize,
}

/// Checks the shape of a delete request without touching storage.
///
/// # Errors
/// - [`ReorderError::EmptyDeleteSet`] when no id is given.
/// - [`ReorderError::DuplicateDeleteId`] naming the first repeated id.
/// - [`ReorderError::MoveTargetDeleted`] when `move_to` is in the set.
pub fn validate_delete_request(
    request: &DeleteRequest,
) -> Result<HashSet<CategoryId>, ReorderError> {
    if request.category_ids.is_empty() {
        return Err(ReorderError::EmptyDeleteSet);
    }
    let mut doomed = HashSet::with_capacity(request.category_ids.len());
    for &id in &request.category_ids {
        if !doomed.insert(id) {
            return Err(ReorderError::DuplicateDeleteId(id));
        }
    }
    if let Some(target) = request.move_to {
        if doomed.contains(&target) {
            return Err(ReorderError::MoveTargetDeleted(target));
        }
    }
    Ok(doomed)
}

impl ReorderEngine {
    /// Deletes the requested categories through the given ports.
    ///
    /// Same unit-of-work contract as [`ReorderEngine::apply`].
    pub fn delete<C, K>(
        &self,
        categories: &C,
        courses: &K,
        request: &DeleteRequest,
    ) -> Result<DeleteOutcome, ReorderError>
    where
        C: CategoryStore + ?Sized,
        K: CourseStore + ?Sized,
    {
        let doomed = validate_delete_request(request)?;
        let gap = self.config().sort_gap;

        for &id in &request.category_ids {
            categories
                .get(id)?
                .ok_or(ReorderError::CategoryNotFound(id))?;
        }
        let target = match request.move_to {
            Some(target_id) => {
                let target = categories
                    .get(target_id)?
                    .ok_or(ReorderError::MoveTargetNotFound(target_id))?;
                ensure_outside_deleted(categories, &target, &doomed)?;
                Some(target)
            }
            None => None,
        };

        let mut orphan_categories: Vec<(CategoryId, i64)> = Vec::new();
        let mut orphan_courses: Vec<(CourseId, i64)> = Vec::new();
        for &id in &request.category_ids {
            let children: Vec<Category> = categories
                .list_children(id)?
                .into_iter()
                .filter(|child| !doomed.contains(&child.id))
                .collect();
            let held = courses.list_by_category(id)?;
            if target.is_none() && (!children.is_empty() || !held.is_empty()) {
                return Err(ReorderError::CategoryNotEmpty {
                    category_id: id,
                    categories: children.len(),
                    courses: held.len(),
                });
            }
            orphan_categories.extend(children.iter().map(|child| (child.id, child.sort_order)));
            orphan_courses.extend(rank_courses(&held));
        }

        let mut outcome = DeleteOutcome {
            deleted: request.category_ids.clone(),
            move_to: request.move_to,
            categories_relocated: orphan_categories.len(),
            courses_relocated: orphan_courses.len(),
            ..DeleteOutcome::default()
        };

        if let Some(target) = &target {
            if !orphan_categories.is_empty() {
                let mut ordered: Vec<(CategoryId, i64)> = categories
                    .list_children(target.id)?
                    .iter()
                    .map(|child| (child.id, child.sort_order))
                    .collect();
                for &(child_id, _) in &orphan_categories {
                    categories.set_parent(child_id, target.id)?;
                }
                ordered.extend(orphan_categories.iter().copied());

                let plan = renumber(&ordered, gap)?;
                for assignment in plan.iter().filter(|item| item.is_changed()) {
                    rewrite_category_key(categories, courses, assignment, gap, &mut outcome)?;
                }
            }

            if !orphan_courses.is_empty() {
                let mut ordered = rank_courses(&courses.list_by_category(target.id)?);
                for &(course_id, _) in &orphan_courses {
                    courses.set_category(course_id, target.id)?;
                }
                ordered.extend(orphan_courses.iter().copied());
                outcome.courses_renumbered +=
                    write_course_keys(courses, target.id, target.sort_order, &ordered, gap)?;
            }
        }

        for &id in &request.category_ids {
            categories.delete(id)?;
        }

        debug!(
            "event=category_delete module=reorder status=ok deleted={} move_to={} categories_relocated={} courses_relocated={} categories_renumbered={} courses_renumbered={}",
            outcome.deleted.len(),
            outcome.move_to.unwrap_or(ROOT_CATEGORY_ID),
            outcome.categories_relocated,
            outcome.courses_relocated,
            outcome.categories_renumbered,
            outcome.courses_renumbered
        );
        Ok(outcome)
    }
}

fn rewrite_category_key<C, K>(
    categories: &C,
    courses: &K,
    assignment: &SortKeyAssignment,
    gap: i64,
    outcome: &mut DeleteOutcome,
) -> Result<(), ReorderError>
where
    C: CategoryStore + ?Sized,
    K: CourseStore + ?Sized,
{
    categories.set_sort_order(assignment.category_id, assignment.assigned)?;
    outcome.categories_renumbered += 1;
    outcome.courses_renumbered +=
        cascade_course_keys(courses, assignment.category_id, assignment.assigned, gap)?;
    Ok(())
}

fn ensure_outside_deleted<C: CategoryStore + ?Sized>(
    categories: &C,
    target: &Category,
    doomed: &HashSet<CategoryId>,
) -> Result<(), ReorderError> {
    let mut visited = HashSet::new();
    let mut cursor = target.parent;
    while cursor != ROOT_CATEGORY_ID && visited.insert(cursor) {
        if doomed.contains(&cursor) {
            return Err(ReorderError::MoveTargetInsideDeleted {
                target: target.id,
                deleted: cursor,
            });
        }
        cursor = match categories.get(cursor)? {
            Some(ancestor) => ancestor.parent,
            None => break,
        };
    }
    Ok(())
}
