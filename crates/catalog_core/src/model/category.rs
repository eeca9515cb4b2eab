//! Course category model.

use serde::Serialize;

/// Stable category identifier.
pub type CategoryId = i64;

/// Parent value of a top-level category.
pub const ROOT_CATEGORY_ID: CategoryId = 0;

/// Page size used when a listing does not name one.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;
/// Largest accepted page size.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// One node of the category forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Stable id assigned at creation.
    pub id: CategoryId,
    /// User-facing name.
    pub name: String,
    /// Containing category, or [`ROOT_CATEGORY_ID`].
    pub parent: CategoryId,
    /// Sibling order key.
    pub sort_order: i64,
    /// Materialized depth, `1` for root categories.
    pub depth: i64,
    /// Materialized id path such as `/3/8`.
    pub path: String,
    pub visible: bool,
    /// Epoch seconds of the last write.
    pub time_modified: i64,
}

impl Category {
    /// Returns whether this category sits at the top of the forest.
    pub fn is_root(&self) -> bool {
        self.parent == ROOT_CATEGORY_ID
    }
}

/// Row filter for category listings; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub parent: Option<CategoryId>,
    pub visible: Option<bool>,
}

/// Paged category listing request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryQuery {
    pub filter: CategoryFilter,
    pub page: i64,
    pub limit: i64,
}

impl Default for CategoryQuery {
    fn default() -> Self {
        Self {
            filter: CategoryFilter::default(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl CategoryQuery {
    pub fn under(mut self, parent: CategoryId) -> Self {
        self.filter.parent = Some(parent);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.filter.visible = Some(visible);
        self
    }

    pub fn page(mut self, page: i64, limit: i64) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }
}

/// One page of a category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPage {
    pub items: Vec<Category>,
    pub page: i64,
    pub limit: i64,
    /// Matching rows across all pages.
    pub total: i64,
}

/// Category with its ordered subcategories, as rendered by admin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTreeNode {
    pub category: Category,
    pub children: Vec<CategoryTreeNode>,
}

impl CategoryTreeNode {
    /// Counts this node and every descendant.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(CategoryTreeNode::subtree_size)
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, CategoryQuery, CategoryTreeNode, DEFAULT_PAGE_LIMIT};

    fn category(id: i64, parent: i64) -> Category {
        Category {
            id,
            name: format!("Category {id}"),
            parent,
            sort_order: 10_000 * id,
            depth: 1,
            path: format!("/{id}"),
            visible: true,
            time_modified: 1_700_000_000,
        }
    }

    #[test]
    fn tree_node_serializes_with_nested_children() {
        let node = CategoryTreeNode {
            category: category(1, 0),
            children: vec![CategoryTreeNode {
                category: category(2, 1),
                children: Vec::new(),
            }],
        };

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["category"]["id"], 1);
        assert_eq!(value["category"]["sort_order"], 10_000);
        assert_eq!(value["category"]["visible"], true);
        assert_eq!(value["children"][0]["category"]["parent"], 1);
        assert_eq!(
            value["children"][0]["children"].as_array().map(Vec::len),
            Some(0)
        );
    }

    #[test]
    fn default_query_is_first_page_of_fifty() {
        let query = CategoryQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(query.filter.parent, None);

        let narrowed = query.under(4).visible(false).page(3, 20);
        assert_eq!(narrowed.filter.parent, Some(4));
        assert_eq!(narrowed.filter.visible, Some(false));
        assert_eq!((narrowed.page, narrowed.limit), (3, 20));
    }
}
