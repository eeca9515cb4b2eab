//! New sibling order for one move request.

use crate::model::category::CategoryId;

/// `before_id` value meaning "append at the end of the sibling list".
pub const MOVE_TO_END: CategoryId = 0;

/// Computes the sibling order after moving `moving` toward `before_id`.
///
/// `siblings` is the target parent's child list as loaded before any write.
///
/// - `before_id == MOVE_TO_END`: `moving` is removed and appended.
/// - `moving` already in the list: a single adjacent swap toward `before_id`.
///   Moving up swaps with the predecessor; moving down swaps with the
///   successor unless `moving` already sits immediately before `before_id`.
///   Reaching a distant slot takes repeated calls.
/// - `moving` not in the list (re-parenting): inserted right before
///   `before_id`.
///
/// A `before_id` missing from `siblings` is treated as [`MOVE_TO_END`].
pub fn reorder_siblings(
    siblings: &[CategoryId],
    moving: CategoryId,
    before_id: CategoryId,
) -> Vec<CategoryId> {
    let mut order = siblings.to_vec();
    let before_index = match before_id {
        MOVE_TO_END => None,
        id => order.iter().position(|sibling| *sibling == id),
    };

    let Some(before_index) = before_index else {
        order.retain(|sibling| *sibling != moving);
        order.push(moving);
        return order;
    };

    match order.iter().position(|sibling| *sibling == moving) {
        None => order.insert(before_index, moving),
        Some(current) if before_index < current => order.swap(current, current - 1),
        Some(current) if before_index > current + 1 => order.swap(current, current + 1),
        Some(_) => {}
    }
    order
}
