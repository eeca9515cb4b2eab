//! Transaction boundary over the category and course stores.
//!
//! # Responsibility
//! - Hand out one [`UnitOfWork`] per use case so multi-row rewrites commit or
//!   roll back together.
//!
//! # Invariants
//! - SQLite write units open as `BEGIN IMMEDIATE`: the write lock is held from
//!   the first read, so two moves cannot interleave their renumbering.
//! - Read units open as `BEGIN DEFERRED` and never take the write lock.
//! - Dropping a unit without [`UnitOfWork::commit`] rolls it back.

use crate::model::category::{Category, CategoryFilter, CategoryId};
use crate::model::course::{Course, CourseId};
use crate::repo::category_repo::{
    count_categories, delete_category, find_categories, get_category, insert_category,
    list_all_categories, list_child_categories, update_category_parent,
    update_category_sort_order, CategoryStore,
};
use crate::repo::course_repo::{
    insert_course, list_category_courses, update_course_category, update_course_sort_order,
    CourseStore,
};
use crate::repo::schema::ensure_catalog_connection_ready;
use crate::repo::StoreResult;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// One atomic batch of store calls.
pub trait UnitOfWork {
    type Categories: CategoryStore;
    type Courses: CourseStore;

    /// Category port bound to this unit.
    fn categories(&self) -> &Self::Categories;
    /// Course port bound to this unit.
    fn courses(&self) -> &Self::Courses;
    /// Makes every write of this unit visible.
    fn commit(self) -> StoreResult<()>;
}

/// Source of units of work.
pub trait CatalogStore {
    type Unit<'a>: UnitOfWork
    where
        Self: 'a;

    /// Opens a new unit of work for writes.
    fn begin(&self) -> StoreResult<Self::Unit<'_>>;

    /// Opens a unit of work that only reads.
    fn begin_read(&self) -> StoreResult<Self::Unit<'_>> {
        self.begin()
    }
}

/// SQLite-backed catalog store over a migrated connection.
#[derive(Clone, Copy)]
pub struct SqliteCatalogStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogStore<'conn> {
    /// Creates the store after verifying the connection schema.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_catalog_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CatalogStore for SqliteCatalogStore<'_> {
    type Unit<'a>
        = SqliteUnitOfWork<'a>
    where
        Self: 'a;

    fn begin(&self) -> StoreResult<SqliteUnitOfWork<'_>> {
        self.open_unit(TransactionBehavior::Immediate)
    }

    fn begin_read(&self) -> StoreResult<SqliteUnitOfWork<'_>> {
        self.open_unit(TransactionBehavior::Deferred)
    }
}

impl<'conn> SqliteCatalogStore<'conn> {
    fn open_unit(&self, behavior: TransactionBehavior) -> StoreResult<SqliteUnitOfWork<'conn>> {
        let tx = Transaction::new_unchecked(self.conn, behavior)?;
        Ok(SqliteUnitOfWork {
            tx,
            store: SqliteCatalogStore { conn: self.conn },
        })
    }
}

/// SQLite unit of work wrapping one transaction.
pub struct SqliteUnitOfWork<'conn> {
    tx: Transaction<'conn>,
    store: SqliteCatalogStore<'conn>,
}

impl<'conn> UnitOfWork for SqliteUnitOfWork<'conn> {
    type Categories = SqliteCatalogStore<'conn>;
    type Courses = SqliteCatalogStore<'conn>;

    fn categories(&self) -> &SqliteCatalogStore<'conn> {
        &self.store
    }

    fn courses(&self) -> &SqliteCatalogStore<'conn> {
        &self.store
    }

    fn commit(self) -> StoreResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

impl CategoryStore for SqliteCatalogStore<'_> {
    fn get(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        get_category(self.conn, id)
    }

    fn list_children(&self, parent: CategoryId) -> StoreResult<Vec<Category>> {
        list_child_categories(self.conn, parent)
    }

    fn list_all(&self) -> StoreResult<Vec<Category>> {
        list_all_categories(self.conn)
    }

    fn set_parent(&self, id: CategoryId, parent: CategoryId) -> StoreResult<()> {
        update_category_parent(self.conn, id, parent)
    }

    fn set_sort_order(&self, id: CategoryId, sort_order: i64) -> StoreResult<()> {
        update_category_sort_order(self.conn, id, sort_order)
    }

    fn insert(&self, parent: CategoryId, name: &str, sort_order: i64) -> StoreResult<Category> {
        insert_category(self.conn, parent, name, sort_order)
    }

    fn find(
        &self,
        filter: &CategoryFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Category>> {
        find_categories(self.conn, filter, limit, offset)
    }

    fn count(&self, filter: &CategoryFilter) -> StoreResult<i64> {
        count_categories(self.conn, filter)
    }

    fn delete(&self, id: CategoryId) -> StoreResult<()> {
        delete_category(self.conn, id)
    }
}

impl CourseStore for SqliteCatalogStore<'_> {
    fn list_by_category(&self, category: CategoryId) -> StoreResult<Vec<Course>> {
        list_category_courses(self.conn, category)
    }

    fn set_sort_order(&self, id: CourseId, sort_order: i64) -> StoreResult<()> {
        update_course_sort_order(self.conn, id, sort_order)
    }

    fn set_category(&self, id: CourseId, category: CategoryId) -> StoreResult<()> {
        update_course_category(self.conn, id, category)
    }

    fn insert(
        &self,
        category: CategoryId,
        full_name: &str,
        short_name: &str,
        sort_order: i64,
    ) -> StoreResult<Course> {
        insert_course(self.conn, category, full_name, short_name, sort_order)
    }
}
