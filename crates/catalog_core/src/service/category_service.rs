//! Category use-case service.
//!
//! # Responsibility
//! - Gate every use case on the caller's capability.
//! - Run each use case inside one unit of work and commit only on success.
//! - Provide category/course creation, deletion and listings around the
//!   reorder engine.
//!
//! # Invariants
//! - A denied or failed call leaves the catalog untouched.
//! - New categories are appended after their siblings with the next gapped
//!   key; new courses are appended inside their category's key range.
//! - Reads run in deferred units and never take the write lock.

use crate::access::{ActorId, CapabilityGate, CatalogCapability};
use crate::config::{ConfigError, ReorderConfig};
use crate::error::ErrorKind;
use crate::model::category::{
    Category, CategoryId, CategoryPage, CategoryQuery, CategoryTreeNode, MAX_PAGE_LIMIT,
    ROOT_CATEGORY_ID,
};
use crate::model::course::Course;
use crate::reorder::{
    DeleteOutcome, DeleteRequest, MoveOutcome, MoveRequest, ReorderEngine, ReorderError,
};
use crate::repo::{CatalogStore, CategoryStore, CourseStore, StoreError, UnitOfWork};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from category service operations.
#[derive(Debug)]
pub enum CategoryServiceError {
    /// Name is blank after trim.
    InvalidName,
    /// Listing page or limit out of range.
    InvalidQuery { field: &'static str, value: i64 },
    /// Gate refused the actor.
    PermissionDenied {
        actor: ActorId,
        capability: CatalogCapability,
    },
    /// Referenced category does not exist.
    CategoryNotFound(CategoryId),
    /// Category cannot take another course inside its key range.
    CourseCapacityExceeded {
        category_id: CategoryId,
        capacity: i64,
    },
    /// Next key under this parent or category does not fit in `i64`.
    SortKeyOverflow(CategoryId),
    /// Move or delete rejected or failed in the reorder engine.
    Reorder(ReorderError),
    /// Store-level failure.
    Store(StoreError),
}

impl CategoryServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName | Self::InvalidQuery { .. } => ErrorKind::InvalidOperation,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::CategoryNotFound(_) => ErrorKind::NotFound,
            Self::CourseCapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::SortKeyOverflow(_) => ErrorKind::KeyOverflow,
            Self::Reorder(err) => err.kind(),
            Self::Store(_) => ErrorKind::Storage,
        }
    }
}

impl Display for CategoryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "name must not be blank"),
            Self::InvalidQuery { field, value } => write!(f, "{field} out of range: {value}"),
            Self::PermissionDenied { actor, capability } => {
                write!(f, "actor {actor} lacks capability {capability}")
            }
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::CourseCapacityExceeded {
                category_id,
                capacity,
            } => write!(
                f,
                "category {category_id} already holds the maximum of {capacity} courses"
            ),
            Self::SortKeyOverflow(id) => {
                write!(f, "next sort key under category {id} exceeds the i64 range")
            }
            Self::Reorder(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CategoryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Reorder(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for CategoryServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::CategoryNotFound(id) => Self::CategoryNotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<ReorderError> for CategoryServiceError {
    fn from(value: ReorderError) -> Self {
        Self::Reorder(value)
    }
}

/// Category service facade.
pub struct CategoryService<S: CatalogStore, G: CapabilityGate> {
    store: S,
    gate: G,
    engine: ReorderEngine,
}

impl<S: CatalogStore, G: CapabilityGate> CategoryService<S, G> {
    /// Creates the service; fails on an invalid config.
    pub fn new(store: S, gate: G, config: ReorderConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            gate,
            engine: ReorderEngine::new(config)?,
        })
    }

    pub fn config(&self) -> &ReorderConfig {
        self.engine.config()
    }

    /// Moves one category and commits the renumbering atomically.
    ///
    /// # Side effects
    /// - Emits `category_move` events with duration, counts and error code.
    pub fn move_category(
        &self,
        actor: ActorId,
        request: MoveRequest,
    ) -> Result<MoveOutcome, CategoryServiceError> {
        let started_at = Instant::now();
        info!(
            "event=category_move module=service status=start actor={actor} category_id={} before_id={} new_parent={:?}",
            request.category_id, request.before_id, request.new_parent
        );

        let result = self
            .authorize(actor, CatalogCapability::ManageCategories)
            .and_then(|()| self.run_move(&request));

        match &result {
            Ok(outcome) => info!(
                "event=category_move module=service status=ok category_id={} parent={} position={} categories_renumbered={} courses_renumbered={} duration_ms={}",
                outcome.category_id,
                outcome.parent,
                outcome.position,
                outcome.categories_renumbered,
                outcome.courses_renumbered,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("category_move", request.category_id, started_at, err),
        }
        result
    }

    /// Deletes categories, relocating their content when `move_to` is set.
    ///
    /// # Side effects
    /// - Emits `category_delete` events with duration, counts and error code.
    pub fn delete_categories(
        &self,
        actor: ActorId,
        request: DeleteRequest,
    ) -> Result<DeleteOutcome, CategoryServiceError> {
        let started_at = Instant::now();
        let first = request
            .category_ids
            .first()
            .copied()
            .unwrap_or(ROOT_CATEGORY_ID);
        info!(
            "event=category_delete module=service status=start actor={actor} count={} move_to={:?}",
            request.category_ids.len(),
            request.move_to
        );

        let result = self
            .authorize(actor, CatalogCapability::ManageCategories)
            .and_then(|()| self.run_delete(&request));

        match &result {
            Ok(outcome) => info!(
                "event=category_delete module=service status=ok deleted={} categories_relocated={} courses_relocated={} duration_ms={}",
                outcome.deleted.len(),
                outcome.categories_relocated,
                outcome.courses_relocated,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("category_delete", first, started_at, err),
        }
        result
    }

    /// Creates a category appended after its future siblings.
    pub fn create_category(
        &self,
        actor: ActorId,
        parent: CategoryId,
        name: impl Into<String>,
    ) -> Result<Category, CategoryServiceError> {
        self.authorize(actor, CatalogCapability::ManageCategories)?;
        let name = normalize_name(name.into())?;

        let unit = self.store.begin()?;
        let categories = unit.categories();
        if parent != ROOT_CATEGORY_ID && categories.get(parent)?.is_none() {
            return Err(CategoryServiceError::CategoryNotFound(parent));
        }
        let siblings = categories.list_children(parent)?;
        let sort_order = next_category_key(&siblings, self.config().sort_gap)
            .ok_or(CategoryServiceError::SortKeyOverflow(parent))?;
        let created = categories.insert(parent, name.as_str(), sort_order)?;
        unit.commit()?;

        info!(
            "event=category_create module=service status=ok category_id={} parent={parent} sort_order={sort_order}",
            created.id
        );
        Ok(created)
    }

    /// Creates a course appended at the end of its category.
    ///
    /// The key follows the highest key already in the category, so legacy
    /// keys that skip offsets are never duplicated.
    pub fn create_course(
        &self,
        actor: ActorId,
        category_id: CategoryId,
        full_name: impl Into<String>,
        short_name: impl Into<String>,
    ) -> Result<Course, CategoryServiceError> {
        self.authorize(actor, CatalogCapability::ManageCategories)?;
        let full_name = normalize_name(full_name.into())?;
        let short_name = normalize_name(short_name.into())?;

        let unit = self.store.begin()?;
        let category = unit
            .categories()
            .get(category_id)?
            .ok_or(CategoryServiceError::CategoryNotFound(category_id))?;
        let existing = unit.courses().list_by_category(category_id)?;
        let capacity = self.config().course_capacity();
        let highest = existing
            .iter()
            .map(|course| course.sort_order)
            .fold(category.sort_order, i64::max);
        let sort_order = highest
            .checked_add(1)
            .ok_or(CategoryServiceError::SortKeyOverflow(category_id))?;
        let ceiling = category.sort_order.checked_add(self.config().sort_gap);
        let range_full = ceiling.is_some_and(|limit| sort_order >= limit);
        if existing.len() as i64 >= capacity || range_full {
            return Err(CategoryServiceError::CourseCapacityExceeded {
                category_id,
                capacity,
            });
        }

        let created = unit.courses().insert(
            category_id,
            full_name.as_str(),
            short_name.as_str(),
            sort_order,
        )?;
        unit.commit()?;
        Ok(created)
    }

    /// Loads one category.
    pub fn get_category(
        &self,
        actor: ActorId,
        id: CategoryId,
    ) -> Result<Category, CategoryServiceError> {
        self.authorize(actor, CatalogCapability::ViewCategories)?;
        let unit = self.store.begin_read()?;
        let category = unit
            .categories()
            .get(id)?
            .ok_or(CategoryServiceError::CategoryNotFound(id))?;
        unit.commit()?;
        Ok(category)
    }

    /// Lists direct children of `parent` in sibling order.
    pub fn list_children(
        &self,
        actor: ActorId,
        parent: CategoryId,
    ) -> Result<Vec<Category>, CategoryServiceError> {
        self.authorize(actor, CatalogCapability::ViewCategories)?;
        let unit = self.store.begin_read()?;
        if parent != ROOT_CATEGORY_ID && unit.categories().get(parent)?.is_none() {
            return Err(CategoryServiceError::CategoryNotFound(parent));
        }
        let children = unit.categories().list_children(parent)?;
        unit.commit()?;
        Ok(children)
    }

    /// Lists one page of categories matching the query filter.
    pub fn list_categories(
        &self,
        actor: ActorId,
        query: CategoryQuery,
    ) -> Result<CategoryPage, CategoryServiceError> {
        self.authorize(actor, CatalogCapability::ViewCategories)?;
        let offset = page_offset(&query)?;

        let unit = self.store.begin_read()?;
        let total = unit.categories().count(&query.filter)?;
        let items = unit
            .categories()
            .find(&query.filter, query.limit, offset)?;
        unit.commit()?;
        Ok(CategoryPage {
            items,
            page: query.page,
            limit: query.limit,
            total,
        })
    }

    /// Lists courses of one category in course order.
    pub fn list_courses(
        &self,
        actor: ActorId,
        category_id: CategoryId,
    ) -> Result<Vec<Course>, CategoryServiceError> {
        self.authorize(actor, CatalogCapability::ViewCategories)?;
        let unit = self.store.begin_read()?;
        if unit.categories().get(category_id)?.is_none() {
            return Err(CategoryServiceError::CategoryNotFound(category_id));
        }
        let courses = unit.courses().list_by_category(category_id)?;
        unit.commit()?;
        Ok(courses)
    }

    /// Loads the whole forest, each level in sibling order.
    ///
    /// Categories whose parent chain does not reach the root are omitted.
    pub fn category_tree(
        &self,
        actor: ActorId,
    ) -> Result<Vec<CategoryTreeNode>, CategoryServiceError> {
        self.authorize(actor, CatalogCapability::ViewCategories)?;
        let unit = self.store.begin_read()?;
        let all = unit.categories().list_all()?;
        unit.commit()?;
        Ok(build_forest(all))
    }

    fn run_move(&self, request: &MoveRequest) -> Result<MoveOutcome, CategoryServiceError> {
        let unit = self.store.begin()?;
        let outcome = self
            .engine
            .apply(unit.categories(), unit.courses(), request)?;
        unit.commit()?;
        Ok(outcome)
    }

    fn run_delete(&self, request: &DeleteRequest) -> Result<DeleteOutcome, CategoryServiceError> {
        let unit = self.store.begin()?;
        let outcome = self
            .engine
            .delete(unit.categories(), unit.courses(), request)?;
        unit.commit()?;
        Ok(outcome)
    }

    fn authorize(
        &self,
        actor: ActorId,
        capability: CatalogCapability,
    ) -> Result<(), CategoryServiceError> {
        if self.gate.is_granted(actor, capability) {
            return Ok(());
        }
        Err(CategoryServiceError::PermissionDenied { actor, capability })
    }
}

fn log_failure(
    event: &str,
    category_id: CategoryId,
    started_at: Instant,
    err: &CategoryServiceError,
) {
    if err.kind() == ErrorKind::Storage {
        error!(
            "event={event} module=service status=error category_id={category_id} duration_ms={} error_code={} error={err}",
            started_at.elapsed().as_millis(),
            err.kind().code()
        );
    } else {
        warn!(
            "event={event} module=service status=rejected category_id={category_id} duration_ms={} error_code={}",
            started_at.elapsed().as_millis(),
            err.kind().code()
        );
    }
}

/// Rounds the highest sibling key up to the next gap slot.
fn next_category_key(siblings: &[Category], gap: i64) -> Option<i64> {
    let last = siblings
        .iter()
        .map(|sibling| sibling.sort_order)
        .max()
        .unwrap_or(0);
    (last / gap).checked_add(1)?.checked_mul(gap)
}

fn page_offset(query: &CategoryQuery) -> Result<i64, CategoryServiceError> {
    if !(1..=MAX_PAGE_LIMIT).contains(&query.limit) {
        return Err(CategoryServiceError::InvalidQuery {
            field: "limit",
            value: query.limit,
        });
    }
    let invalid_page = CategoryServiceError::InvalidQuery {
        field: "page",
        value: query.page,
    };
    if query.page < 1 {
        return Err(invalid_page);
    }
    (query.page - 1)
        .checked_mul(query.limit)
        .ok_or(invalid_page)
}

fn build_forest(all: Vec<Category>) -> Vec<CategoryTreeNode> {
    let mut by_parent: BTreeMap<CategoryId, Vec<Category>> = BTreeMap::new();
    for category in all {
        by_parent.entry(category.parent).or_default().push(category);
    }
    attach_children(ROOT_CATEGORY_ID, &mut by_parent)
}

fn attach_children(
    parent: CategoryId,
    by_parent: &mut BTreeMap<CategoryId, Vec<Category>>,
) -> Vec<CategoryTreeNode> {
    let Some(children) = by_parent.remove(&parent) else {
        return Vec::new();
    };
    children
        .into_iter()
        .map(|category| {
            let children = attach_children(category.id, by_parent);
            CategoryTreeNode { category, children }
        })
        .collect()
}

fn normalize_name(value: String) -> Result<String, CategoryServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CategoryServiceError::InvalidName);
    }
    Ok(trimmed.to_string())
}
