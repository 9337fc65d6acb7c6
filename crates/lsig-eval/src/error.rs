use lsig_isa::DecodeError;
use thiserror::Error;

/// Ordinary checker and evaluator failures.
///
/// Every variant is an expected rejection of an untrusted program; none of
/// them indicates a defect in the evaluator itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("program version {version} exceeds consensus limit {max}")]
    VersionTooHigh { version: u64, max: u64 },
    #[error("{op} at pc {pc}: branch target {target} is not an aligned instruction")]
    MisalignedBranch {
        op: &'static str,
        pc: usize,
        target: usize,
    },
    #[error("{op} at pc {pc}: invalid field {field}")]
    InvalidField {
        op: &'static str,
        pc: usize,
        field: u8,
    },
    #[error("program cost {cost} exceeds limit {max}")]
    CostExceeded { cost: u64, max: u64 },
    #[error("{op} at pc {pc}: stack underflow")]
    StackUnderflow { op: &'static str, pc: usize },
    #[error("{op} at pc {pc}: stack overflow")]
    StackOverflow { op: &'static str, pc: usize },
    #[error("{op} at pc {pc}: expected {expected}")]
    TypeMismatch {
        op: &'static str,
        pc: usize,
        expected: &'static str,
    },
    #[error("{op} at pc {pc}: arithmetic overflow")]
    Overflow { op: &'static str, pc: usize },
    #[error("{op} at pc {pc}: arithmetic underflow")]
    Underflow { op: &'static str, pc: usize },
    #[error("{op} at pc {pc}: division by zero")]
    DivideByZero { op: &'static str, pc: usize },
    #[error("{op} at pc {pc}: shift amount {amount} is too large")]
    ShiftTooLarge {
        op: &'static str,
        pc: usize,
        amount: u64,
    },
    #[error("{op} at pc {pc}: result of {len} bytes exceeds the byte string limit")]
    BytesTooLong {
        op: &'static str,
        pc: usize,
        len: usize,
    },
    #[error("btoi at pc {pc}: input of {len} bytes is longer than 8")]
    BtoiTooLong { pc: usize, len: usize },
    #[error("{op} at pc {pc}: index {index} beyond {len} constants")]
    ConstantIndex {
        op: &'static str,
        pc: usize,
        index: usize,
        len: usize,
    },
    #[error("{op} at pc {pc}: cannot load arg {index} of {count}")]
    ArgIndex {
        op: &'static str,
        pc: usize,
        index: usize,
        count: usize,
    },
    #[error("{op} at pc {pc}: group index {index} beyond group of {size}")]
    GroupIndex {
        op: &'static str,
        pc: usize,
        index: usize,
        size: usize,
    },
    #[error("{op} at pc {pc}: range {start}..{end} outside {len} bytes")]
    RangeOutOfBounds {
        op: &'static str,
        pc: usize,
        start: u64,
        end: u64,
        len: usize,
    },
    #[error("{op} at pc {pc}: depth {depth} exceeds stack height {height}")]
    DepthOutOfRange {
        op: &'static str,
        pc: usize,
        depth: u8,
        height: usize,
    },
    #[error("global at pc {pc}: {field} requires ledger state")]
    LedgerUnavailable { pc: usize, field: &'static str },
    #[error("err opcode executed at pc {pc}")]
    ErrOpcode { pc: usize },
    #[error("assert failed at pc {pc}")]
    AssertFailed { pc: usize },
    #[error("callsub at pc {pc}: call depth limit reached")]
    CallDepth { pc: usize },
    #[error("retsub at pc {pc}: no subroutine to return from")]
    RetsubWithoutCall { pc: usize },
    #[error("stack length is {len} at end of program, expected 1")]
    FinalStack { len: usize },
    #[error("program ended with a byte string on top of the stack")]
    FinalType,
}

/// Unknown engine name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown engine `{0}` (expected one of: stepper, lowered)")]
pub struct ParseEngineError(pub String);

/// Unknown transaction type name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown transaction type `{0}` (expected one of: pay, keyreg, acfg, axfer, afrz, appl)")]
pub struct ParseTxnTypeError(pub String);
