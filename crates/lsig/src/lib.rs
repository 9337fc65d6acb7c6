//! LSIG - differential fuzzing for logic signature evaluators
//!
//! Feeds the same untrusted input to two evaluator engines and escalates
//! whenever they disagree or either one panics.
//!
//! # Example
//!
//! ```ignore
//! use lsig::{DiffConfig, Driver, FuzzInput};
//!
//! let driver = Driver::new(&DiffConfig::default());
//! let input = FuzzInput::new(vec![0x03, 0x81, 0x01], vec![]);
//! assert!(driver.run(&input).is_ok());
//! ```

pub use lsig_eval::{ContextProfile, Engine, EngineKind, EvalError, EvalParams, TxnType};

mod config;
mod diff;
mod error;
mod fuzz;
mod input;
pub mod metrics;
mod report;

pub use config::{
    ConfigError, DiffConfig, ENV_CANDIDATE, ENV_CANDIDATE_TXN_TYPE, ENV_LOGIC_VERSION,
    ENV_MAX_COST, ENV_REFERENCE, ENV_REFERENCE_TXN_TYPE,
};
pub use diff::{
    Driver, Escalation, EscalationKind, Failure, Finding, Observation, Outcome, PanicInfo, Phase,
    PhaseRecord, Verdict, guarded,
};
pub use error::{Error, Result};
pub use fuzz::{fuzz_one, fuzz_with};
pub use input::{EncodeError, FuzzInput, MAX_INPUT_LEN, Skip, decode};
pub use report::Report;

use tracing_subscriber::EnvFilter;

/// Install a stderr `tracing` subscriber.
///
/// `RUST_LOG` is honored; `default_directives` (e.g. `lsig=info`,
/// comma separated) are added on top. Does nothing if a subscriber is
/// already installed.
pub fn init_logging(default_directives: &str) {
    let mut filter = EnvFilter::from_default_env();
    for directive in default_directives.split(',').filter_map(|d| d.parse().ok()) {
        filter = filter.add_directive(directive);
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
