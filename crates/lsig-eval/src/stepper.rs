//! Engine that decodes at the program counter on every step.

use lsig_isa::decode;
use tracing::debug;

use crate::check::{check, validate};
use crate::machine::{Flow, Machine};
use crate::{Engine, EvalError, EvalParams};

/// Step-by-step interpreter.
///
/// The program is validated in one sweep before execution starts; after
/// that each instruction is decoded again when control reaches it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stepper;

impl Engine for Stepper {
    fn name(&self) -> &'static str {
        "stepper"
    }

    fn check(&self, program: &[u8], params: &EvalParams) -> Result<u64, EvalError> {
        check(program, params)
    }

    fn evaluate(&self, program: &[u8], params: &EvalParams) -> Result<bool, EvalError> {
        // Nothing runs, so nothing approves.
        if program.is_empty() {
            return Ok(false);
        }
        let layout = validate(program, params)?;

        let mut machine = Machine::new(params, layout.version);
        let mut pc = layout.start;
        let mut steps = 0u64;
        let result = loop {
            if pc >= program.len() {
                break machine.finish();
            }
            let instr = decode(program, pc, layout.version)?;
            steps += 1;
            match machine.exec(&instr)? {
                Flow::Next => pc = instr.next_pc(),
                Flow::Jump(target) => pc = target,
                Flow::Exit(passed) => break Ok(passed),
            }
        };

        debug!(engine = "stepper", steps, cost = machine.cost(), ?result, "evaluated");
        result
    }
}
