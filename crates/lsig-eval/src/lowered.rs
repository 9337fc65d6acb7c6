//! Engine that lowers the program to an instruction vector once.

use lsig_isa::{DecodedInstr, decode_program};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::check::{check_fields, check_static_cost, check_version};
use crate::machine::{Flow, Machine};
use crate::{Engine, EvalError, EvalParams};

/// Program lowered for index dispatch.
struct LoweredProgram {
    version: u64,
    instrs: Vec<DecodedInstr>,
    /// Program offset to instruction index. The end of the program maps
    /// to `instrs.len()`.
    index: FxHashMap<usize, usize>,
    cost: u64,
}

impl LoweredProgram {
    fn lower(program: &[u8], params: &EvalParams) -> Result<Self, EvalError> {
        check_version(program, params)?;
        let decoded = decode_program(program)?;

        let mut index =
            FxHashMap::with_capacity_and_hasher(decoded.instrs.len() + 1, Default::default());
        let mut cost = 0u64;
        for (i, instr) in decoded.instrs.iter().enumerate() {
            check_fields(instr, decoded.version)?;
            index.insert(instr.pc, i);
            cost = cost.saturating_add(instr.op.cost);
        }
        index.insert(decoded.len, decoded.instrs.len());

        for instr in &decoded.instrs {
            if let Some(target) = instr.branch_target()
                && !index.contains_key(&target)
            {
                return Err(EvalError::MisalignedBranch {
                    op: instr.op.name,
                    pc: instr.pc,
                    target,
                });
            }
        }

        Ok(Self {
            version: decoded.version,
            instrs: decoded.instrs,
            index,
            cost,
        })
    }

    /// Instruction index for a jump from `from` to program offset `target`.
    fn resolve(&self, from: &DecodedInstr, target: usize) -> Result<usize, EvalError> {
        self.index
            .get(&target)
            .copied()
            .ok_or(EvalError::MisalignedBranch {
                op: from.op.name,
                pc: from.pc,
                target,
            })
    }
}

/// Index-dispatched interpreter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lowered;

impl Engine for Lowered {
    fn name(&self) -> &'static str {
        "lowered"
    }

    fn check(&self, program: &[u8], params: &EvalParams) -> Result<u64, EvalError> {
        if program.is_empty() {
            return Ok(0);
        }
        let lowered = LoweredProgram::lower(program, params)?;
        check_static_cost(lowered.version, lowered.cost, params)
    }

    fn evaluate(&self, program: &[u8], params: &EvalParams) -> Result<bool, EvalError> {
        if program.is_empty() {
            return Ok(false);
        }
        let lowered = LoweredProgram::lower(program, params)?;

        let mut machine = Machine::new(params, lowered.version);
        let mut next = 0usize;
        let mut steps = 0u64;
        let result = loop {
            let Some(instr) = lowered.instrs.get(next) else {
                break machine.finish();
            };
            steps += 1;
            match machine.exec(instr)? {
                Flow::Next => next += 1,
                Flow::Jump(target) => next = lowered.resolve(instr, target)?,
                Flow::Exit(passed) => break Ok(passed),
            }
        };

        debug!(engine = "lowered", steps, cost = machine.cost(), ?result, "evaluated");
        result
    }
}
