//! Canonical gapped sort keys for an ordered sibling list.

use crate::model::category::CategoryId;
use crate::reorder::ReorderError;

/// Sort key planned for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKeyAssignment {
    pub category_id: CategoryId,
    pub previous: i64,
    pub assigned: i64,
}

impl SortKeyAssignment {
    pub fn is_changed(&self) -> bool {
        self.previous != self.assigned
    }
}

/// Assigns `(position + 1) * gap` to each `(id, previous_key)` in order.
///
/// Running it on an already canonical list yields no changed assignment.
///
/// # Errors
/// - [`ReorderError::SortKeyOverflow`] naming the first category whose key
///   does not fit in `i64`.
pub fn renumber(
    ordered: &[(CategoryId, i64)],
    gap: i64,
) -> Result<Vec<SortKeyAssignment>, ReorderError> {
    ordered
        .iter()
        .zip(1_i64..)
        .map(|(&(category_id, previous), slot)| {
            let assigned = slot
                .checked_mul(gap)
                .ok_or(ReorderError::SortKeyOverflow { category_id })?;
            Ok(SortKeyAssignment {
                category_id,
                previous,
                assigned,
            })
        })
        .collect()
}
