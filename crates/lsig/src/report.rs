//! Reproduction report for an escalated input.

use std::fmt;

use lsig_eval::Engine;
use tracing::warn;

use crate::diff::guarded;
use crate::input::FuzzInput;

/// Everything needed to reproduce an input outside the fuzzer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub program_hex: String,
    /// Disassembly text, or why it could not be produced.
    pub disassembly: Result<String, String>,
    /// Hex of each argument, in order.
    pub args_hex: Vec<String>,
}

impl Report {
    /// Build a report, disassembling with `engine`.
    ///
    /// Disassembly failures, including panics, end up in the report and
    /// are never escalated.
    pub fn new(engine: &dyn Engine, input: &FuzzInput) -> Self {
        let disassembly = match guarded(|| engine.disassemble(&input.program)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(e.to_string()),
            Err(info) => {
                warn!(engine = engine.name(), panic = %info, "panic while disassembling program");
                Err(format!("panic while disassembling program: {info}"))
            }
        };

        Self {
            program_hex: hex::encode(&input.program),
            disassembly,
            args_hex: input.args.iter().map(hex::encode).collect(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "program bytes: {}", self.program_hex)?;
        match &self.disassembly {
            Ok(text) => {
                writeln!(f, "program disassembly:")?;
                for line in text.lines() {
                    writeln!(f, "  {line}")?;
                }
            }
            Err(reason) => writeln!(f, "program disassembly failed: {reason}")?,
        }
        writeln!(f, "program args: {}", self.args_hex.len())?;
        for (i, arg) in self.args_hex.iter().enumerate() {
            writeln!(f, "arg {i}: {arg}")?;
        }
        Ok(())
    }
}
