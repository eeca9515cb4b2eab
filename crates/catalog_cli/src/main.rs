//! `catalog` command-line entry point.
//!
//! Local maintenance tool over a catalog SQLite file: initialize the schema,
//! create, list and delete categories, add courses, print the forest and move
//! categories.

use anyhow::Result;

mod cli;

fn main() -> Result<()> {
    let action = cli::start()?;

    action.execute()?;

    Ok(())
}
