//! Evaluator capability shared by all providers.

use std::fmt;
use std::str::FromStr;

use crate::{EvalError, EvalParams, Lowered, ParseEngineError, Stepper};

/// A checker and evaluator for logic programs.
///
/// Implementations must be pure functions of their inputs: the same
/// program and parameters always produce the same result.
pub trait Engine: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Validate `program` without executing it, returning its static cost.
    fn check(&self, program: &[u8], params: &EvalParams) -> Result<u64, EvalError>;

    /// Execute `program`, returning whether it approved the transaction.
    fn evaluate(&self, program: &[u8], params: &EvalParams) -> Result<bool, EvalError>;

    /// Render `program` as assembly text.
    fn disassemble(&self, program: &[u8]) -> Result<String, EvalError> {
        Ok(lsig_isa::disassemble(program)?)
    }
}

/// Selectable engine provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Decodes at the program counter on every step.
    #[default]
    Stepper,
    /// Lowers the program once, then dispatches by instruction index.
    Lowered,
}

impl EngineKind {
    pub const ALL: [Self; 2] = [Self::Stepper, Self::Lowered];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Stepper => "stepper",
            Self::Lowered => "lowered",
        }
    }

    /// The provider for this kind.
    pub fn engine(self) -> &'static dyn Engine {
        match self {
            Self::Stepper => &Stepper,
            Self::Lowered => &Lowered,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineKind {
    type Err = ParseEngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEngineError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_parse() {
        assert_eq!("stepper".parse::<EngineKind>(), Ok(EngineKind::Stepper));
        assert_eq!(" Lowered ".parse::<EngineKind>(), Ok(EngineKind::Lowered));
        assert_eq!(
            "jit".parse::<EngineKind>(),
            Err(ParseEngineError("jit".to_string()))
        );
    }

    #[test]
    fn test_engine_kind_names_match_providers() {
        for kind in EngineKind::ALL {
            assert_eq!(kind.engine().name(), kind.name());
            assert_eq!(kind.to_string().parse::<EngineKind>(), Ok(kind));
        }
    }
}
