//! Command implementations.
//!
//! Each submodule handles one CLI command.

mod eval;
mod inspect;
mod pack;
mod run;

use std::path::Path;

use lsig::{DiffConfig, EngineKind, Error, FuzzInput};

use crate::cli::{Cli, Commands, ContextArgs};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Run { .. } => handle_run(cli),
        Commands::Inspect { input } => inspect::cmd_inspect(input),
        Commands::Eval { .. } => handle_eval(cli),
        Commands::Pack {
            program,
            args,
            output,
        } => pack::cmd_pack(program, args, output),
    }
}

fn handle_run(cli: &Cli) -> i32 {
    let Commands::Run {
        paths,
        reference,
        candidate,
        jobs,
        context,
    } = &cli.command
    else {
        unreachable!("run command variant mismatch");
    };

    run::cmd_run(paths, *reference, *candidate, *context, *jobs)
}

fn handle_eval(cli: &Cli) -> i32 {
    let Commands::Eval {
        input,
        engine,
        context,
    } = &cli.command
    else {
        unreachable!("eval command variant mismatch");
    };

    eval::cmd_eval(input, *engine, *context)
}

/// Environment configuration with command-line overrides applied.
fn build_config(
    reference: Option<EngineKind>,
    candidate: Option<EngineKind>,
    context: ContextArgs,
) -> lsig::Result<DiffConfig> {
    let mut config = DiffConfig::from_env()?;
    if let Some(kind) = reference {
        config.reference = kind;
    }
    if let Some(kind) = candidate {
        config.candidate = kind;
    }
    if let Some(version) = context.logic_version {
        config = config.with_logic_version(version)?;
    }
    if let Some(kind) = context.reference_txn_type {
        config.reference_profile.kind = kind;
    }
    if let Some(kind) = context.candidate_txn_type {
        config.candidate_profile.kind = kind;
    }
    if let Some(max_cost) = context.max_cost {
        config = config.with_max_cost(max_cost);
    }
    Ok(config)
}

/// Read and decode an input file.
fn read_input(path: &Path) -> lsig::Result<FuzzInput> {
    let raw = std::fs::read(path)?;
    lsig::decode(&raw).map_err(Error::Skipped)
}
