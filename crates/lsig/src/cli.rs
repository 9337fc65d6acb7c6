//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lsig::{EngineKind, TxnType};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "lsig")]
#[command(about = "Differential fuzzing harness for logic signature evaluators")]
#[command(version)]
pub struct Cli {
    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay fuzz inputs through the differential driver
    Run {
        /// Input files, or directories of input files
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Reference engine (default: stepper, or LSIG_REFERENCE)
        #[arg(long)]
        reference: Option<EngineKind>,

        /// Candidate engine (default: lowered, or LSIG_CANDIDATE)
        #[arg(long)]
        candidate: Option<EngineKind>,

        /// Number of parallel jobs (0 = auto)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,

        #[command(flatten)]
        context: ContextArgs,
    },
    /// Decode a fuzz input and print its reproduction report
    Inspect {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Check and evaluate a fuzz input with a single engine
    Eval {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Engine to run
        #[arg(long, default_value = "stepper")]
        engine: EngineKind,

        #[command(flatten)]
        context: ContextArgs,
    },
    /// Write a fuzz input file from a hex program and arguments
    Pack {
        /// Program bytes as hex
        #[arg(long, value_name = "HEX")]
        program: String,

        /// Argument bytes as hex (repeatable)
        #[arg(long = "arg", value_name = "HEX")]
        args: Vec<String>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Overrides for the synthetic evaluation context.
#[derive(Args, Clone, Copy, Debug)]
pub struct ContextArgs {
    /// Highest accepted program version (default 5, or LSIG_LOGIC_VERSION)
    #[arg(long)]
    pub logic_version: Option<u64>,

    /// Cost ceiling (default 100000, or LSIG_MAX_COST)
    #[arg(long)]
    pub max_cost: Option<u64>,

    /// Reference transaction type, e.g. pay or appl (or LSIG_REFERENCE_TXN_TYPE)
    #[arg(long, value_name = "TYPE")]
    pub reference_txn_type: Option<TxnType>,

    /// Candidate transaction type (or LSIG_CANDIDATE_TXN_TYPE)
    #[arg(long, value_name = "TYPE")]
    pub candidate_txn_type: Option<TxnType>,
}
