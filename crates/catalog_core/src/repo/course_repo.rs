//! Course store contract and SQLite queries.

use crate::model::category::CategoryId;
use crate::model::course::{Course, CourseId};
use crate::repo::{StoreError, StoreResult};
use rusqlite::{params, Connection, Row};

/// Course persistence port used by the course cascade.
pub trait CourseStore {
    /// Lists courses of one category ordered by `(sort_order, id)`.
    fn list_by_category(&self, category: CategoryId) -> StoreResult<Vec<Course>>;
    /// Rewrites the sort key of one course.
    fn set_sort_order(&self, id: CourseId, sort_order: i64) -> StoreResult<()>;
    /// Moves one course into another category without touching its key.
    fn set_category(&self, id: CourseId, category: CategoryId) -> StoreResult<()>;
    /// Inserts one course and returns the stored row.
    fn insert(
        &self,
        category: CategoryId,
        full_name: &str,
        short_name: &str,
        sort_order: i64,
    ) -> StoreResult<Course>;
}

pub(crate) fn list_category_courses(
    conn: &Connection,
    category: CategoryId,
) -> StoreResult<Vec<Course>> {
    let mut stmt = conn.prepare(
        "SELECT id, category, fullname, shortname, sortorder, visible, timemodified
         FROM courses
         WHERE category = ?1
         ORDER BY sortorder ASC, id ASC;",
    )?;
    let mut rows = stmt.query([category])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_course_row(row)?);
    }
    Ok(items)
}

pub(crate) fn update_course_sort_order(
    conn: &Connection,
    id: CourseId,
    sort_order: i64,
) -> StoreResult<()> {
    let changed = conn.execute(
        "UPDATE courses
         SET sortorder = ?2,
             timemodified = CAST(strftime('%s', 'now') AS INTEGER)
         WHERE id = ?1;",
        params![id, sort_order],
    )?;
    if changed == 0 {
        return Err(StoreError::CourseNotFound(id));
    }
    Ok(())
}

pub(crate) fn update_course_category(
    conn: &Connection,
    id: CourseId,
    category: CategoryId,
) -> StoreResult<()> {
    let changed = conn.execute(
        "UPDATE courses
         SET category = ?2,
             timemodified = CAST(strftime('%s', 'now') AS INTEGER)
         WHERE id = ?1;",
        params![id, category],
    )?;
    if changed == 0 {
        return Err(StoreError::CourseNotFound(id));
    }
    Ok(())
}

pub(crate) fn insert_course(
    conn: &Connection,
    category: CategoryId,
    full_name: &str,
    short_name: &str,
    sort_order: i64,
) -> StoreResult<Course> {
    conn.execute(
        "INSERT INTO courses (category, fullname, shortname, sortorder, visible)
         VALUES (?1, ?2, ?3, ?4, 1);",
        params![category, full_name, short_name, sort_order],
    )?;
    let id = conn.last_insert_rowid();

    let mut stmt = conn.prepare(
        "SELECT id, category, fullname, shortname, sortorder, visible, timemodified
         FROM courses
         WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => parse_course_row(row),
        None => Err(StoreError::CourseNotFound(id)),
    }
}

fn parse_course_row(row: &Row<'_>) -> StoreResult<Course> {
    let id: CourseId = row.get("id")?;
    let visible = match row.get::<_, i64>("visible")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid visible value `{other}` in courses.visible for id {id}"
            )));
        }
    };

    Ok(Course {
        id,
        category: row.get("category")?,
        full_name: row.get("fullname")?,
        short_name: row.get("shortname")?,
        sort_order: row.get("sortorder")?,
        visible,
        time_modified: row.get("timemodified")?,
    })
}
