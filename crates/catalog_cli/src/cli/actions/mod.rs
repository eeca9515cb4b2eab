use catalog_core::{CategoryId, CategoryQuery, ReorderConfig};
use std::path::PathBuf;

// Interpreter for `Action`; the match lives in `run` so this file only
// describes what can be requested.
mod run;

/// Arguments shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub db: PathBuf,
    pub config: ReorderConfig,
}

#[derive(Debug)]
pub enum Action {
    Init(GlobalArgs),
    AddCategory {
        globals: GlobalArgs,
        parent: CategoryId,
        name: String,
    },
    AddCourse {
        globals: GlobalArgs,
        category: CategoryId,
        full_name: String,
        short_name: String,
    },
    Tree {
        globals: GlobalArgs,
        json: bool,
    },
    List {
        globals: GlobalArgs,
        query: CategoryQuery,
        json: bool,
    },
    Delete {
        globals: GlobalArgs,
        ids: Vec<CategoryId>,
        move_to: Option<CategoryId>,
    },
    Move {
        globals: GlobalArgs,
        id: CategoryId,
        before: CategoryId,
        parent: Option<CategoryId>,
    },
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the database cannot be opened or the use case fails.
    pub fn execute(self) -> anyhow::Result<()> {
        run::execute(self)
    }
}
