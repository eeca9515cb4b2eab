use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};
use std::path::PathBuf;

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("catalog")
        .about("Course catalog category maintenance")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("db")
                .short('d')
                .long("db")
                .help("Path to the catalog SQLite file")
                .env("CATALOG_DB")
                .global(true)
                .default_value("catalog.sqlite3")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("sort-gap")
                .long("sort-gap")
                .help("Spacing between sibling category sort keys")
                .env("CATALOG_SORT_GAP")
                .global(true)
                .default_value("10000")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("strict-ancestry")
                .long("strict-ancestry")
                .help("Reject moving a category under one of its own descendants")
                .env("CATALOG_STRICT_ANCESTRY")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Log level: error, warn, info, debug, trace")
                .env("CATALOG_LOG_LEVEL")
                .global(true)
                .value_parser(["error", "warn", "info", "debug", "trace"]),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .help("Absolute directory for rolling log files; logging is off when unset")
                .env("CATALOG_LOG_DIR")
                .global(true),
        )
        .subcommand(
            Command::new("init")
                .about("Create the catalog file and apply migrations"),
        )
        .subcommand(
            Command::new("add-category")
                .about("Append a category under a parent")
                .arg(Arg::new("name").help("Category name").required(true))
                .arg(
                    Arg::new("parent")
                        .long("parent")
                        .help("Parent category id, 0 for a top-level category")
                        .default_value("0")
                        .value_parser(clap::value_parser!(i64)),
                ),
        )
        .subcommand(
            Command::new("add-course")
                .about("Append a course to a category")
                .arg(
                    Arg::new("category")
                        .long("category")
                        .help("Owning category id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    Arg::new("full-name")
                        .help("Course full name")
                        .required(true),
                )
                .arg(
                    Arg::new("short-name")
                        .help("Course short name")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("tree")
                .about("Print the category forest with courses")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("list")
                .about("List one page of categories in sort order")
                .arg(
                    Arg::new("parent")
                        .long("parent")
                        .help("Only categories under this parent, 0 for the top level")
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    Arg::new("visible")
                        .long("visible")
                        .help("Only visible (true) or hidden (false) categories")
                        .value_parser(clap::value_parser!(bool)),
                )
                .arg(
                    Arg::new("page")
                        .long("page")
                        .help("1-based page number")
                        .default_value("1")
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .help("Page size, at most 100")
                        .default_value("50")
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete categories, optionally moving their content elsewhere")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .help("Category to delete; repeat for several")
                        .required(true)
                        .action(ArgAction::Append)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    Arg::new("move-to")
                        .long("move-to")
                        .help("Category receiving child categories and courses")
                        .value_parser(clap::value_parser!(i64)),
                ),
        )
        .subcommand(
            Command::new("move")
                .about("Move a category one step toward a sibling, or to the end")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .help("Category to move")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    Arg::new("before")
                        .long("before")
                        .help("Sibling to move toward, 0 to move to the end")
                        .default_value("0")
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    Arg::new("parent")
                        .long("parent")
                        .help("New parent id, 0 for the top level")
                        .value_parser(clap::value_parser!(i64)),
                ),
        )
}

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .help("Print JSON instead of text")
        .action(ArgAction::SetTrue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "catalog");
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
        command.debug_assert();
    }

    #[test]
    fn test_move_args() {
        let matches = new().get_matches_from(vec![
            "catalog",
            "--db",
            "/tmp/catalog.sqlite3",
            "move",
            "--id",
            "12",
            "--before",
            "7",
            "--parent",
            "3",
        ]);

        assert_eq!(
            matches.get_one::<PathBuf>("db").cloned(),
            Some(PathBuf::from("/tmp/catalog.sqlite3"))
        );
        let (name, sub) = matches.subcommand().expect("subcommand");
        assert_eq!(name, "move");
        assert_eq!(sub.get_one::<i64>("id").copied(), Some(12));
        assert_eq!(sub.get_one::<i64>("before").copied(), Some(7));
        assert_eq!(sub.get_one::<i64>("parent").copied(), Some(3));
    }

    #[test]
    fn test_move_defaults_to_end_and_keeps_parent() {
        let matches = new().get_matches_from(vec!["catalog", "move", "--id", "4"]);
        let (_, sub) = matches.subcommand().expect("subcommand");

        assert_eq!(sub.get_one::<i64>("before").copied(), Some(0));
        assert_eq!(sub.get_one::<i64>("parent"), None);
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let matches = new().get_matches_from(vec![
            "catalog",
            "tree",
            "--sort-gap",
            "100",
            "--strict-ancestry",
        ]);

        assert_eq!(matches.get_one::<i64>("sort-gap").copied(), Some(100));
        assert!(matches.get_flag("strict-ancestry"));
    }

    #[test]
    fn test_missing_subcommand_fails() {
        let result = new()
            .try_get_matches_from(vec!["catalog", "--db", "x.sqlite3"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_log_level_fails() {
        let result = new()
            .try_get_matches_from(vec!["catalog", "--log-level", "loud", "tree"]);
        assert_eq!(
            result.map_err(|e| e.kind()).err(),
            Some(clap::error::ErrorKind::InvalidValue)
        );
    }

    #[test]
    fn test_delete_collects_repeated_ids() {
        let matches = new().get_matches_from(vec![
            "catalog",
            "delete",
            "--id",
            "3",
            "--id",
            "8",
            "--move-to",
            "1",
        ]);
        let (name, sub) = matches.subcommand().expect("subcommand");

        assert_eq!(name, "delete");
        let ids: Vec<i64> = sub.get_many::<i64>("id").expect("ids").copied().collect();
        assert_eq!(ids, vec![3, 8]);
        assert_eq!(sub.get_one::<i64>("move-to").copied(), Some(1));
    }

    #[test]
    fn test_delete_requires_an_id() {
        let result = new().try_get_matches_from(vec!["catalog", "delete"]);
        assert_eq!(
            result.map_err(|e| e.kind()).err(),
            Some(clap::error::ErrorKind::MissingRequiredArgument)
        );
    }

    #[test]
    fn test_list_defaults_and_filters() {
        let matches = new().get_matches_from(vec![
            "catalog",
            "list",
            "--visible",
            "false",
            "--json",
        ]);
        let (_, sub) = matches.subcommand().expect("subcommand");

        assert_eq!(sub.get_one::<i64>("page").copied(), Some(1));
        assert_eq!(sub.get_one::<i64>("limit").copied(), Some(50));
        assert_eq!(sub.get_one::<bool>("visible").copied(), Some(false));
        assert_eq!(sub.get_one::<i64>("parent"), None);
        assert!(sub.get_flag("json"));
    }
}
