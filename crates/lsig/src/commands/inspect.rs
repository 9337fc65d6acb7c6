//! Inspect command.

use std::path::Path;

use lsig::{DiffConfig, Error, Report};
use tracing::error;

use super::read_input;
use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal;

/// Handle the `inspect` command.
pub fn cmd_inspect(input: &Path) -> i32 {
    let config = match DiffConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return EXIT_FAILURE;
        }
    };

    let decoded = match read_input(input) {
        Ok(decoded) => decoded,
        Err(Error::Skipped(skip)) => {
            terminal::warning(&format!("{}: {skip}", input.display()));
            return EXIT_FAILURE;
        }
        Err(e) => {
            error!(error = %e, path = %input.display(), "failed to read input");
            return EXIT_FAILURE;
        }
    };

    terminal::title(&input.display().to_string());
    print!("{}", Report::new(config.reference.engine(), &decoded));
    EXIT_SUCCESS
}
