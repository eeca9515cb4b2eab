//! Category store contract and SQLite queries.
//!
//! # Invariants
//! - Child listing is deterministic: `sortorder ASC, id ASC`.
//! - `depth` and `path` are derived from the parent at insert time only.

use crate::model::category::{Category, CategoryFilter, CategoryId, ROOT_CATEGORY_ID};
use crate::repo::{StoreError, StoreResult};
use rusqlite::{params, Connection, Row};

const CATEGORY_COLUMNS: &str = "id, name, parent, sortorder, depth, path, visible, timemodified";

/// Category persistence port used by the reorder engine and the service.
pub trait CategoryStore {
    /// Loads one category by id.
    fn get(&self, id: CategoryId) -> StoreResult<Option<Category>>;
    /// Lists direct children of `parent` ordered by `(sort_order, id)`.
    fn list_children(&self, parent: CategoryId) -> StoreResult<Vec<Category>>;
    /// Lists every category ordered by `(parent, sort_order, id)`.
    fn list_all(&self) -> StoreResult<Vec<Category>>;
    /// Rewrites the parent of one category.
    fn set_parent(&self, id: CategoryId, parent: CategoryId) -> StoreResult<()>;
    /// Rewrites the sort key of one category.
    fn set_sort_order(&self, id: CategoryId, sort_order: i64) -> StoreResult<()>;
    /// Inserts one category and returns the stored row.
    fn insert(&self, parent: CategoryId, name: &str, sort_order: i64) -> StoreResult<Category>;
    /// Lists one page of matching categories ordered by `(sort_order, id)`.
    fn find(&self, filter: &CategoryFilter, limit: i64, offset: i64) -> StoreResult<Vec<Category>>;
    /// Counts categories matching `filter`.
    fn count(&self, filter: &CategoryFilter) -> StoreResult<i64>;
    /// Deletes one category row; courses must have been moved out first.
    fn delete(&self, id: CategoryId) -> StoreResult<()>;
}

pub(crate) fn get_category(conn: &Connection, id: CategoryId) -> StoreResult<Option<Category>> {
    let sql = format!("SELECT {CATEGORY_COLUMNS} FROM course_categories WHERE id = ?1;");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_category_row(row)?));
    }
    Ok(None)
}

pub(crate) fn list_child_categories(
    conn: &Connection,
    parent: CategoryId,
) -> StoreResult<Vec<Category>> {
    let sql = format!(
        "SELECT {CATEGORY_COLUMNS}
         FROM course_categories
         WHERE parent = ?1
         ORDER BY sortorder ASC, id ASC;"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([parent])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_category_row(row)?);
    }
    Ok(items)
}

pub(crate) fn list_all_categories(conn: &Connection) -> StoreResult<Vec<Category>> {
    let sql = format!(
        "SELECT {CATEGORY_COLUMNS}
         FROM course_categories
         ORDER BY parent ASC, sortorder ASC, id ASC;"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_category_row(row)?);
    }
    Ok(items)
}

pub(crate) fn update_category_parent(
    conn: &Connection,
    id: CategoryId,
    parent: CategoryId,
) -> StoreResult<()> {
    let changed = conn.execute(
        "UPDATE course_categories
         SET parent = ?2,
             timemodified = CAST(strftime('%s', 'now') AS INTEGER)
         WHERE id = ?1;",
        params![id, parent],
    )?;
    if changed == 0 {
        return Err(StoreError::CategoryNotFound(id));
    }
    Ok(())
}

pub(crate) fn update_category_sort_order(
    conn: &Connection,
    id: CategoryId,
    sort_order: i64,
) -> StoreResult<()> {
    let changed = conn.execute(
        "UPDATE course_categories
         SET sortorder = ?2,
             timemodified = CAST(strftime('%s', 'now') AS INTEGER)
         WHERE id = ?1;",
        params![id, sort_order],
    )?;
    if changed == 0 {
        return Err(StoreError::CategoryNotFound(id));
    }
    Ok(())
}

pub(crate) fn insert_category(
    conn: &Connection,
    parent: CategoryId,
    name: &str,
    sort_order: i64,
) -> StoreResult<Category> {
    let (depth, parent_path) = if parent == ROOT_CATEGORY_ID {
        (1, String::new())
    } else {
        let parent_row =
            get_category(conn, parent)?.ok_or(StoreError::CategoryNotFound(parent))?;
        (parent_row.depth + 1, parent_row.path)
    };

    conn.execute(
        "INSERT INTO course_categories (name, parent, sortorder, depth, path, visible)
         VALUES (?1, ?2, ?3, ?4, '', 1);",
        params![name, parent, sort_order, depth],
    )?;
    let id = conn.last_insert_rowid();
    conn.execute(
        "UPDATE course_categories SET path = ?2 WHERE id = ?1;",
        params![id, format!("{parent_path}/{id}")],
    )?;

    get_category(conn, id)?.ok_or(StoreError::CategoryNotFound(id))
}

pub(crate) fn find_categories(
    conn: &Connection,
    filter: &CategoryFilter,
    limit: i64,
    offset: i64,
) -> StoreResult<Vec<Category>> {
    let sql = format!(
        "SELECT {CATEGORY_COLUMNS}
         FROM course_categories
         WHERE (?1 IS NULL OR parent = ?1)
           AND (?2 IS NULL OR visible = ?2)
         ORDER BY sortorder ASC, id ASC
         LIMIT ?3 OFFSET ?4;"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![
        filter.parent,
        filter.visible.map(i64::from),
        limit,
        offset,
    ])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_category_row(row)?);
    }
    Ok(items)
}

pub(crate) fn count_categories(conn: &Connection, filter: &CategoryFilter) -> StoreResult<i64> {
    let total = conn.query_row(
        "SELECT COUNT(*)
         FROM course_categories
         WHERE (?1 IS NULL OR parent = ?1)
           AND (?2 IS NULL OR visible = ?2);",
        params![filter.parent, filter.visible.map(i64::from)],
        |row| row.get(0),
    )?;
    Ok(total)
}

pub(crate) fn delete_category(conn: &Connection, id: CategoryId) -> StoreResult<()> {
    let changed = conn.execute("DELETE FROM course_categories WHERE id = ?1;", [id])?;
    if changed == 0 {
        return Err(StoreError::CategoryNotFound(id));
    }
    Ok(())
}

fn parse_category_row(row: &Row<'_>) -> StoreResult<Category> {
    let id: CategoryId = row.get("id")?;
    let visible = match row.get::<_, i64>("visible")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid visible value `{other}` in course_categories.visible for id {id}"
            )));
        }
    };

    Ok(Category {
        id,
        name: row.get("name")?,
        parent: row.get("parent")?,
        sort_order: row.get("sortorder")?,
        depth: row.get("depth")?,
        path: row.get("path")?,
        visible,
        time_modified: row.get("timemodified")?,
    })
}
