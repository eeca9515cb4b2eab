use crate::cli::actions::{Action, GlobalArgs};
use anyhow::{anyhow, Context, Result};
use catalog_core::{CategoryQuery, ReorderConfig, DEFAULT_PAGE_LIMIT};
use std::path::PathBuf;

/// Resolves parsed arguments into an [`Action`].
///
/// # Errors
/// Returns an error if a required argument is missing or the sort gap is invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = globals(matches)?;

    let (name, sub_m) = matches
        .subcommand()
        .context("missing subcommand, see --help")?;

    match name {
        "init" => Ok(Action::Init(globals)),
        "add-category" => Ok(Action::AddCategory {
            globals,
            parent: sub_m.get_one::<i64>("parent").copied().unwrap_or(0),
            name: required_string(sub_m, "name")?,
        }),
        "add-course" => Ok(Action::AddCourse {
            globals,
            category: sub_m
                .get_one::<i64>("category")
                .copied()
                .context("missing required argument: --category")?,
            full_name: required_string(sub_m, "full-name")?,
            short_name: required_string(sub_m, "short-name")?,
        }),
        "tree" => Ok(Action::Tree {
            globals,
            json: sub_m.get_flag("json"),
        }),
        "list" => Ok(Action::List {
            globals,
            query: list_query(sub_m),
            json: sub_m.get_flag("json"),
        }),
        "delete" => Ok(Action::Delete {
            globals,
            ids: sub_m
                .get_many::<i64>("id")
                .context("missing required argument: --id")?
                .copied()
                .collect(),
            move_to: sub_m.get_one::<i64>("move-to").copied(),
        }),
        "move" => Ok(Action::Move {
            globals,
            id: sub_m
                .get_one::<i64>("id")
                .copied()
                .context("missing required argument: --id")?,
            before: sub_m.get_one::<i64>("before").copied().unwrap_or(0),
            parent: sub_m.get_one::<i64>("parent").copied(),
        }),
        other => Err(anyhow!("unknown subcommand: {other}")),
    }
}

fn globals(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let db = matches
        .get_one::<PathBuf>("db")
        .cloned()
        .context("missing required argument: --db")?;
    let sort_gap = matches
        .get_one::<i64>("sort-gap")
        .copied()
        .unwrap_or(catalog_core::DEFAULT_SORT_GAP);
    let config = ReorderConfig::with_sort_gap(sort_gap)
        .context("invalid CATALOG_SORT_GAP")?
        .strict_ancestry(matches.get_flag("strict-ancestry"));

    Ok(GlobalArgs { db, config })
}

fn list_query(matches: &clap::ArgMatches) -> CategoryQuery {
    let page = matches.get_one::<i64>("page").copied().unwrap_or(1);
    let limit = matches
        .get_one::<i64>("limit")
        .copied()
        .unwrap_or(DEFAULT_PAGE_LIMIT);
    let mut query = CategoryQuery::default().page(page, limit);
    if let Some(parent) = matches.get_one::<i64>("parent").copied() {
        query = query.under(parent);
    }
    if let Some(visible) = matches.get_one::<bool>("visible").copied() {
        query = query.visible(visible);
    }
    query
}

fn required_string(matches: &clap::ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn test_handler_move() {
        let matches = commands::new().get_matches_from(vec![
            "catalog",
            "--sort-gap",
            "500",
            "move",
            "--id",
            "9",
            "--parent",
            "0",
        ]);

        match handler(&matches).expect("move action") {
            Action::Move {
                globals,
                id,
                before,
                parent,
            } => {
                assert_eq!(id, 9);
                assert_eq!(before, 0);
                assert_eq!(parent, Some(0));
                assert_eq!(globals.config.sort_gap, 500);
                assert!(!globals.config.strict_ancestry);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_handler_add_course() {
        let matches = commands::new().get_matches_from(vec![
            "catalog",
            "add-course",
            "--category",
            "4",
            "Linear algebra",
            "LA1",
        ]);

        match handler(&matches).expect("add-course action") {
            Action::AddCourse {
                category,
                full_name,
                short_name,
                ..
            } => {
                assert_eq!(category, 4);
                assert_eq!(full_name, "Linear algebra");
                assert_eq!(short_name, "LA1");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_handler_delete() {
        let matches = commands::new().get_matches_from(vec![
            "catalog",
            "delete",
            "--id",
            "5",
            "--id",
            "6",
        ]);

        match handler(&matches).expect("delete action") {
            Action::Delete { ids, move_to, .. } => {
                assert_eq!(ids, vec![5, 6]);
                assert_eq!(move_to, None);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_handler_list_builds_query() {
        let matches = commands::new().get_matches_from(vec![
            "catalog",
            "list",
            "--parent",
            "0",
            "--page",
            "2",
            "--limit",
            "10",
        ]);

        match handler(&matches).expect("list action") {
            Action::List { query, json, .. } => {
                assert_eq!(query.filter.parent, Some(0));
                assert_eq!(query.filter.visible, None);
                assert_eq!((query.page, query.limit), (2, 10));
                assert!(!json);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_handler_rejects_small_gap() {
        let matches = commands::new()
            .get_matches_from(vec!["catalog", "--sort-gap", "1", "tree"]);
        let err = handler(&matches).expect_err("gap 1 must be rejected");
        assert!(err.to_string().contains("CATALOG_SORT_GAP"));
    }
}
