use crate::cli::{actions::Action, commands, dispatch::handler};
use anyhow::{anyhow, Result};

/// Parses the command line, starts file logging when requested and resolves
/// the action to run.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    if let Some(log_dir) = matches.get_one::<String>("log-dir") {
        let level = matches
            .get_one::<String>("log-level")
            .map_or_else(
                || catalog_core::default_log_level().to_string(),
                String::clone,
            );
        catalog_core::init_logging(&level, log_dir)
            .map_err(|err| anyhow!(err))?;
    }

    handler(&matches)
}
