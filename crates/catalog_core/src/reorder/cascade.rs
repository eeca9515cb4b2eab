//! Course sort-key cascade below a renumbered category.

use crate::model::category::CategoryId;
use crate::model::course::{Course, CourseId};
use crate::reorder::ReorderError;
use crate::repo::CourseStore;
use log::debug;

/// Sort key planned for one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseKeyAssignment {
    pub course_id: CourseId,
    pub previous: i64,
    pub assigned: i64,
}

/// Ranks courses by their previous `(sort_order, id)`.
pub fn rank_courses(courses: &[Course]) -> Vec<(CourseId, i64)> {
    let mut ranked: Vec<(i64, CourseId)> = courses
        .iter()
        .map(|course| (course.sort_order, course.id))
        .collect();
    ranked.sort_unstable();
    ranked.into_iter().map(|(key, id)| (id, key)).collect()
}

/// Plans `category_sort_order + local_index + 1` for each course.
///
/// Courses are ranked by their previous `(sort_order, id)`, so relative order
/// survives even when absolute keys move.
pub fn plan_course_keys(
    category_id: CategoryId,
    category_sort_order: i64,
    courses: &[Course],
) -> Result<Vec<CourseKeyAssignment>, ReorderError> {
    sequence_course_keys(category_id, category_sort_order, &rank_courses(courses))
}

/// Assigns consecutive keys above `category_sort_order` in the given order.
pub fn sequence_course_keys(
    category_id: CategoryId,
    category_sort_order: i64,
    ordered: &[(CourseId, i64)],
) -> Result<Vec<CourseKeyAssignment>, ReorderError> {
    ordered
        .iter()
        .zip(1_i64..)
        .map(|(&(course_id, previous), offset)| {
            let assigned = category_sort_order
                .checked_add(offset)
                .ok_or(ReorderError::SortKeyOverflow { category_id })?;
            Ok(CourseKeyAssignment {
                course_id,
                previous,
                assigned,
            })
        })
        .collect()
}

/// Rewrites course keys of one category and returns how many rows changed.
///
/// # Errors
/// - [`ReorderError::GapCapacityExceeded`] when the category holds more
///   courses than `gap - 1`; nothing is written for that category.
/// - [`ReorderError::SortKeyOverflow`] when a course key does not fit.
/// - [`ReorderError::Store`] on persistence failure.
pub fn cascade_course_keys<K: CourseStore + ?Sized>(
    courses: &K,
    category_id: CategoryId,
    category_sort_order: i64,
    gap: i64,
) -> Result<usize, ReorderError> {
    let rows = courses.list_by_category(category_id)?;
    write_course_keys(
        courses,
        category_id,
        category_sort_order,
        &rank_courses(&rows),
        gap,
    )
}

/// Writes consecutive keys for an already ordered course list of one
/// category, skipping rows whose key is unchanged.
pub(crate) fn write_course_keys<K: CourseStore + ?Sized>(
    courses: &K,
    category_id: CategoryId,
    category_sort_order: i64,
    ordered: &[(CourseId, i64)],
    gap: i64,
) -> Result<usize, ReorderError> {
    let course_count = ordered.len();
    if course_count as i64 > gap - 1 {
        return Err(ReorderError::GapCapacityExceeded {
            category_id,
            course_count,
            gap,
        });
    }

    let mut rewritten = 0;
    for assignment in sequence_course_keys(category_id, category_sort_order, ordered)? {
        if assignment.previous == assignment.assigned {
            continue;
        }
        courses.set_sort_order(assignment.course_id, assignment.assigned)?;
        rewritten += 1;
    }

    debug!(
        "event=course_cascade module=reorder status=ok category_id={category_id} course_count={course_count} rewritten={rewritten}"
    );
    Ok(rewritten)
}
