//! Checker and evaluators for logic signature programs.
//!
//! Two engines implement [`Engine`] over the same stack machine:
//!
//! - [`Stepper`] decodes at the program counter on every step
//! - [`Lowered`] decodes the whole program once and dispatches by index
//!
//! Both accept and reject exactly the same programs, which is what makes
//! them useful as a differential pair.

mod check;
mod context;
mod engine;
mod error;
mod lowered;
mod machine;
mod stepper;
mod value;

pub use check::{DYNAMIC_COST_VERSION, check};
pub use context::{
    Address, ConsensusParams, ContextProfile, EvalParams, Ledger, LogicSig, SignedTxn,
    Transaction, TxnType,
};
pub use engine::{Engine, EngineKind};
pub use error::{EvalError, ParseEngineError, ParseTxnTypeError};
pub use lowered::Lowered;
pub use machine::{MAX_BYTES_LEN, MAX_CALL_DEPTH, MAX_STACK_DEPTH};
pub use stepper::Stepper;
pub use value::StackValue;
