//! Eval command.

use std::path::Path;

use lsig::{EngineKind, Error, EvalParams, guarded};
use tracing::error;

use super::{build_config, read_input};
use crate::cli::{ContextArgs, EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal;

/// Handle the `eval` command.
///
/// Runs check then evaluate on one engine, using the reference context
/// profile. Panics are caught and reported like errors.
pub fn cmd_eval(input: &Path, kind: EngineKind, context: ContextArgs) -> i32 {
    let config = match build_config(None, None, context) {
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

    let engine = kind.engine();
    let params =
        EvalParams::for_logic_sig(&config.reference_profile, &decoded.program, &decoded.args);
    terminal::status(
        "Evaluating",
        &format!(
            "{} on {} bytes, {} args",
            engine.name(),
            decoded.program.len(),
            decoded.args.len()
        ),
    );

    match guarded(|| engine.check(&decoded.program, &params)) {
        Ok(Ok(cost)) => println!("check: ok, cost {cost}"),
        Ok(Err(e)) => println!("check: {e}"),
        Err(info) => {
            terminal::failed("Panicked", &format!("check: {info}"));
            return EXIT_FAILURE;
        }
    }

    match guarded(|| engine.evaluate(&decoded.program, &params)) {
        Ok(Ok(true)) => {
            terminal::finished("Passed", "program accepted");
            EXIT_SUCCESS
        }
        Ok(Ok(false)) => {
            terminal::finished("Rejected", "program returned zero");
            EXIT_SUCCESS
        }
        Ok(Err(e)) => {
            terminal::finished("Failed", &e.to_string());
            EXIT_SUCCESS
        }
        Err(info) => {
            terminal::failed("Panicked", &format!("eval: {info}"));
            EXIT_FAILURE
        }
    }
}
