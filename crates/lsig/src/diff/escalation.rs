use std::fmt;

use super::PanicInfo;
use crate::report::Report;

/// Driver phase, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Check,
    Eval,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Eval => "eval",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong in a phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EscalationKind {
    /// An engine panicked.
    Panic {
        engine: &'static str,
        info: PanicInfo,
    },
    /// One engine failed and the other did not. Each side holds the error
    /// text, or `None` when it succeeded.
    NilnessMismatch {
        reference: Option<String>,
        candidate: Option<String>,
    },
    /// Both checkers succeeded with different costs.
    CostMismatch { reference: u64, candidate: u64 },
    /// Both evaluators succeeded with different verdicts.
    PassMismatch { reference: bool, candidate: bool },
}

impl EscalationKind {
    /// Metric label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Panic { .. } => "panic",
            Self::NilnessMismatch { .. } => "nilness_mismatch",
            Self::CostMismatch { .. } => "cost_mismatch",
            Self::PassMismatch { .. } => "pass_mismatch",
        }
    }
}

/// A mismatch found by the driver, before any report is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    pub phase: Phase,
    pub kind: EscalationKind,
}

/// A defect found by the driver, with everything needed to reproduce it.
#[derive(Clone, Debug)]
pub struct Escalation {
    pub phase: Phase,
    pub kind: EscalationKind,
    pub report: Report,
}

impl fmt::Display for Escalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = self.phase;
        match &self.kind {
            EscalationKind::Panic { engine, info } => {
                write!(f, "{engine} panicked during {phase}: {info}")
            }
            EscalationKind::NilnessMismatch {
                reference,
                candidate,
            } => write!(
                f,
                "{phase} error nilness not equal! {} != {}",
                reference.as_deref().unwrap_or("<nil>"),
                candidate.as_deref().unwrap_or("<nil>")
            ),
            EscalationKind::CostMismatch {
                reference,
                candidate,
            } => write!(f, "costs not equal! {reference} != {candidate}"),
            EscalationKind::PassMismatch {
                reference,
                candidate,
            } => write!(f, "success not equal! {reference} != {candidate}"),
        }
    }
}

impl std::error::Error for Escalation {}
