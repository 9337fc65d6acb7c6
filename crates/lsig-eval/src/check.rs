//! Static validation and cost estimation.

use lsig_isa::{DecodedInstr, InstrArgs, OP_GLOBAL, OP_GTXN, OP_TXN, decode, read_version};
use tracing::trace;

use crate::machine::{global_field_for, txn_field_for};
use crate::{EvalError, EvalParams};

/// First version whose cost is charged while running instead of up front.
pub const DYNAMIC_COST_VERSION: u64 = 4;

/// Result of a validation sweep.
#[derive(Clone, Debug)]
pub(crate) struct Layout {
    pub version: u64,
    /// Offset of the first instruction.
    pub start: usize,
    /// Sum of the static costs of every instruction.
    pub cost: u64,
}

/// Read the version prefix and enforce the consensus limit.
pub(crate) fn check_version(
    program: &[u8],
    params: &EvalParams,
) -> Result<(u64, usize), EvalError> {
    let (version, start) = read_version(program)?;
    let max = params.proto.logic_sig_version;
    if version > max {
        return Err(EvalError::VersionTooHigh { version, max });
    }
    Ok((version, start))
}

/// Reject `txn`, `gtxn` and `global` immediates naming unknown fields.
pub(crate) fn check_fields(instr: &DecodedInstr, version: u64) -> Result<(), EvalError> {
    let (field, known) = match (instr.op.opcode, &instr.args) {
        (OP_TXN, InstrArgs::U8(f)) | (OP_GTXN, InstrArgs::U8x2(_, f)) => {
            (*f, txn_field_for(*f, version).is_some())
        }
        (OP_GLOBAL, InstrArgs::U8(f)) => (*f, global_field_for(*f, version).is_some()),
        _ => return Ok(()),
    };
    if known {
        Ok(())
    } else {
        Err(EvalError::InvalidField {
            op: instr.op.name,
            pc: instr.pc,
            field,
        })
    }
}

/// Static cost ceiling, enforced only for versions without dynamic cost.
pub(crate) fn check_static_cost(
    version: u64,
    cost: u64,
    params: &EvalParams,
) -> Result<u64, EvalError> {
    let max = params.proto.logic_sig_max_cost;
    if version < DYNAMIC_COST_VERSION && cost > max {
        return Err(EvalError::CostExceeded { cost, max });
    }
    Ok(cost)
}

/// Decode the whole program once, checking fields and branch alignment.
pub(crate) fn validate(program: &[u8], params: &EvalParams) -> Result<Layout, EvalError> {
    let (version, start) = check_version(program, params)?;

    let mut starts = vec![false; program.len() + 1];
    let mut branches = Vec::new();
    let mut cost = 0u64;
    let mut pc = start;
    while pc < program.len() {
        let instr = decode(program, pc, version)?;
        check_fields(&instr, version)?;
        starts[pc] = true;
        cost = cost.saturating_add(instr.op.cost);
        if let Some(target) = instr.branch_target() {
            branches.push((instr.op.name, pc, target));
        }
        pc = instr.next_pc();
    }
    starts[program.len()] = true;

    for (op, pc, target) in branches {
        if !starts[target] {
            return Err(EvalError::MisalignedBranch { op, pc, target });
        }
    }

    trace!(version, cost, len = program.len(), "validated program");
    Ok(Layout {
        version,
        start,
        cost,
    })
}

/// Validate `program` without running it and return its static cost.
///
/// An empty program has nothing to reject and costs 0.
pub fn check(program: &[u8], params: &EvalParams) -> Result<u64, EvalError> {
    if program.is_empty() {
        return Ok(0);
    }
    let layout = validate(program, params)?;
    check_static_cost(layout.version, layout.cost, params)
}
