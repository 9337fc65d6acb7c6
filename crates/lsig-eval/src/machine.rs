//! Stack machine semantics shared by both engines.
//!
//! The machine executes one decoded instruction at a time and reports how
//! control continues. Engines own dispatch: where the next instruction
//! comes from and how a branch target is located.

use lsig_isa::{
    DecodedInstr, GlobalField, InstrArgs, TxnField, OP_ADD, OP_AND, OP_ARG, OP_ARG_0, OP_ARG_1,
    OP_ARG_2, OP_ARG_3, OP_ASSERT, OP_B, OP_BITAND, OP_BITLEN, OP_BITNOT, OP_BITOR, OP_BITXOR,
    OP_BNZ, OP_BTOI, OP_BYTEC, OP_BYTEC_0, OP_BYTEC_1, OP_BYTEC_2, OP_BYTEC_3, OP_BYTECBLOCK,
    OP_BZ, OP_CALLSUB, OP_CONCAT, OP_COVER, OP_DIG, OP_DIV, OP_DUP, OP_DUP2, OP_EQ, OP_ERR,
    OP_EXTRACT, OP_EXTRACT3, OP_EXTRACT_UINT16, OP_EXTRACT_UINT32, OP_EXTRACT_UINT64, OP_GE,
    OP_GLOBAL, OP_GT, OP_GTXN, OP_INTC, OP_INTC_0, OP_INTC_1, OP_INTC_2, OP_INTC_3, OP_INTCBLOCK,
    OP_ITOB, OP_KECCAK256, OP_LE, OP_LEN, OP_LT, OP_MOD, OP_MUL, OP_MULW, OP_NEQ, OP_NOT, OP_OR,
    OP_POP, OP_PUSHBYTES, OP_PUSHINT, OP_RETSUB, OP_RETURN, OP_SELECT, OP_SHA256, OP_SHA512_256,
    OP_SHL, OP_SHR, OP_SQRT, OP_SUB, OP_SUBSTRING, OP_SUBSTRING3, OP_SWAP, OP_TXN, OP_UNCOVER,
};
use sha2::{Digest, Sha256, Sha512_256};
use sha3::Keccak256;

use crate::{EvalError, EvalParams, StackValue};

/// Maximum number of values on the stack.
pub const MAX_STACK_DEPTH: usize = 1000;
/// Maximum length of a byte string value.
pub const MAX_BYTES_LEN: usize = 4096;
/// Maximum subroutine nesting.
pub const MAX_CALL_DEPTH: usize = 1024;

/// How control continues after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Next,
    /// Continue at an absolute program offset.
    Jump(usize),
    Exit(bool),
}

pub(crate) struct Machine<'a> {
    params: &'a EvalParams,
    version: u64,
    stack: Vec<StackValue>,
    /// Return offsets of active subroutine calls.
    calls: Vec<usize>,
    int_consts: Vec<u64>,
    byte_consts: Vec<Vec<u8>>,
    cost: u64,
    op: &'static str,
    pc: usize,
}

impl<'a> Machine<'a> {
    pub(crate) fn new(params: &'a EvalParams, version: u64) -> Self {
        Self {
            params,
            version,
            stack: Vec::new(),
            calls: Vec::new(),
            int_consts: Vec::new(),
            byte_consts: Vec::new(),
            cost: 0,
            op: "",
            pc: 0,
        }
    }

    /// Total cost charged so far.
    pub(crate) const fn cost(&self) -> u64 {
        self.cost
    }

    /// Verdict when execution runs off the end of the program.
    pub(crate) fn finish(&self) -> Result<bool, EvalError> {
        match self.stack.as_slice() {
            [StackValue::Uint(v)] => Ok(*v != 0),
            [StackValue::Bytes(_)] => Err(EvalError::FinalType),
            other => Err(EvalError::FinalStack { len: other.len() }),
        }
    }

    /// Charge for and execute one instruction.
    pub(crate) fn exec(&mut self, instr: &DecodedInstr) -> Result<Flow, EvalError> {
        self.op = instr.op.name;
        self.pc = instr.pc;

        self.cost = self.cost.saturating_add(instr.op.cost);
        let max = self.params.proto.logic_sig_max_cost;
        if self.cost > max {
            return Err(EvalError::CostExceeded {
                cost: self.cost,
                max,
            });
        }

        let pc = instr.pc;
        match (instr.op.opcode, &instr.args) {
            (OP_ERR, _) => return Err(EvalError::ErrOpcode { pc }),
            (OP_SHA256, _) => {
                let data = self.pop_bytes()?;
                self.push(Sha256::digest(&data).to_vec())?;
            }
            (OP_KECCAK256, _) => {
                let data = self.pop_bytes()?;
                self.push(Keccak256::digest(&data).to_vec())?;
            }
            (OP_SHA512_256, _) => {
                let data = self.pop_bytes()?;
                self.push(Sha512_256::digest(&data).to_vec())?;
            }
            (OP_ADD, _) => self.arith(|m, a, b| a.checked_add(b).ok_or_else(|| m.overflow()))?,
            (OP_SUB, _) => self.arith(|m, a, b| {
                a.checked_sub(b).ok_or(EvalError::Underflow { op: m.op, pc: m.pc })
            })?,
            (OP_DIV, _) => self.arith(|m, a, b| a.checked_div(b).ok_or_else(|| m.div_zero()))?,
            (OP_MUL, _) => self.arith(|m, a, b| a.checked_mul(b).ok_or_else(|| m.overflow()))?,
            (OP_MOD, _) => self.arith(|m, a, b| a.checked_rem(b).ok_or_else(|| m.div_zero()))?,
            (OP_LT, _) => self.arith(|_, a, b| Ok(u64::from(a < b)))?,
            (OP_GT, _) => self.arith(|_, a, b| Ok(u64::from(a > b)))?,
            (OP_LE, _) => self.arith(|_, a, b| Ok(u64::from(a <= b)))?,
            (OP_GE, _) => self.arith(|_, a, b| Ok(u64::from(a >= b)))?,
            (OP_AND, _) => self.arith(|_, a, b| Ok(u64::from(a != 0 && b != 0)))?,
            (OP_OR, _) => self.arith(|_, a, b| Ok(u64::from(a != 0 || b != 0)))?,
            (OP_BITOR, _) => self.arith(|_, a, b| Ok(a | b))?,
            (OP_BITAND, _) => self.arith(|_, a, b| Ok(a & b))?,
            (OP_BITXOR, _) => self.arith(|_, a, b| Ok(a ^ b))?,
            (OP_SHL, _) => self.arith(|m, a, b| m.shift_amount(b).map(|s| a << s))?,
            (OP_SHR, _) => self.arith(|m, a, b| m.shift_amount(b).map(|s| a >> s))?,
            (OP_EQ | OP_NEQ, _) => {
                let b = self.pop()?;
                let a = self.pop()?;
                let equal = match (&a, &b) {
                    (StackValue::Uint(x), StackValue::Uint(y)) => x == y,
                    (StackValue::Bytes(x), StackValue::Bytes(y)) => x == y,
                    _ => return Err(self.type_mismatch(a.type_name())),
                };
                self.push(equal == (instr.op.opcode == OP_EQ))?;
            }
            (OP_NOT, _) => {
                let a = self.pop_uint()?;
                self.push(a == 0)?;
            }
            (OP_BITNOT, _) => {
                let a = self.pop_uint()?;
                self.push(!a)?;
            }
            (OP_SQRT, _) => {
                let a = self.pop_uint()?;
                self.push(a.isqrt())?;
            }
            (OP_BITLEN, _) => {
                let bits = match self.pop()? {
                    StackValue::Uint(v) => u64::from(64 - v.leading_zeros()),
                    StackValue::Bytes(b) => bytes_bitlen(&b),
                };
                self.push(bits)?;
            }
            (OP_LEN, _) => {
                let data = self.pop_bytes()?;
                self.push(data.len() as u64)?;
            }
            (OP_ITOB, _) => {
                let a = self.pop_uint()?;
                self.push(a.to_be_bytes().to_vec())?;
            }
            (OP_BTOI, _) => {
                let data = self.pop_bytes()?;
                if data.len() > 8 {
                    return Err(EvalError::BtoiTooLong {
                        pc,
                        len: data.len(),
                    });
                }
                let value = data.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
                self.push(value)?;
            }
            (OP_MULW, _) => {
                let b = self.pop_uint()?;
                let a = self.pop_uint()?;
                let product = u128::from(a) * u128::from(b);
                self.push((product >> 64) as u64)?;
                self.push(product as u64)?;
            }
            (OP_INTCBLOCK, InstrArgs::UintBlock(values)) => self.int_consts.clone_from(values),
            (OP_BYTECBLOCK, InstrArgs::BytesBlock(values)) => self.byte_consts.clone_from(values),
            (OP_INTC, InstrArgs::U8(n)) => self.push_int_const(usize::from(*n))?,
            (OP_INTC_0 | OP_INTC_1 | OP_INTC_2 | OP_INTC_3, _) => {
                self.push_int_const(usize::from(instr.op.opcode - OP_INTC_0))?;
            }
            (OP_BYTEC, InstrArgs::U8(n)) => self.push_byte_const(usize::from(*n))?,
            (OP_BYTEC_0 | OP_BYTEC_1 | OP_BYTEC_2 | OP_BYTEC_3, _) => {
                self.push_byte_const(usize::from(instr.op.opcode - OP_BYTEC_0))?;
            }
            (OP_ARG, InstrArgs::U8(n)) => self.push_arg(usize::from(*n))?,
            (OP_ARG_0 | OP_ARG_1 | OP_ARG_2 | OP_ARG_3, _) => {
                self.push_arg(usize::from(instr.op.opcode - OP_ARG_0))?;
            }
            (OP_TXN, InstrArgs::U8(field)) => {
                let value = self.txn_field(self.params.group_index, *field)?;
                self.push(value)?;
            }
            (OP_GTXN, InstrArgs::U8x2(group, field)) => {
                let value = self.txn_field(usize::from(*group), *field)?;
                self.push(value)?;
            }
            (OP_GLOBAL, InstrArgs::U8(field)) => {
                let value = self.global_field(*field)?;
                self.push(value)?;
            }
            (OP_BNZ, InstrArgs::Branch { target, .. }) => {
                if self.pop_uint()? != 0 {
                    return Ok(Flow::Jump(*target));
                }
            }
            (OP_BZ, InstrArgs::Branch { target, .. }) => {
                if self.pop_uint()? == 0 {
                    return Ok(Flow::Jump(*target));
                }
            }
            (OP_B, InstrArgs::Branch { target, .. }) => return Ok(Flow::Jump(*target)),
            (OP_CALLSUB, InstrArgs::Branch { target, .. }) => {
                if self.calls.len() >= MAX_CALL_DEPTH {
                    return Err(EvalError::CallDepth { pc });
                }
                self.calls.push(instr.next_pc());
                return Ok(Flow::Jump(*target));
            }
            (OP_RETSUB, _) => {
                let ret = self
                    .calls
                    .pop()
                    .ok_or(EvalError::RetsubWithoutCall { pc })?;
                return Ok(Flow::Jump(ret));
            }
            (OP_RETURN, _) => return Ok(Flow::Exit(self.pop_uint()? != 0)),
            (OP_ASSERT, _) => {
                if self.pop_uint()? == 0 {
                    return Err(EvalError::AssertFailed { pc });
                }
            }
            (OP_POP, _) => {
                self.pop()?;
            }
            (OP_DUP, _) => {
                let top = self.peek(0)?;
                self.push(top)?;
            }
            (OP_DUP2, _) => {
                let a = self.peek(1)?;
                let b = self.peek(0)?;
                self.push(a)?;
                self.push(b)?;
            }
            (OP_DIG, InstrArgs::U8(depth)) => {
                let value = self.peek(*depth)?;
                self.push(value)?;
            }
            (OP_SWAP, _) => {
                let len = self.depth_check(1)?;
                self.stack.swap(len - 1, len - 2);
            }
            (OP_SELECT, _) => {
                let cond = self.pop_uint()?;
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(if cond != 0 { b } else { a })?;
            }
            (OP_COVER, InstrArgs::U8(depth)) => {
                let len = self.depth_check(*depth)?;
                if let Some(top) = self.stack.pop() {
                    self.stack.insert(len - 1 - usize::from(*depth), top);
                }
            }
            (OP_UNCOVER, InstrArgs::U8(depth)) => {
                let len = self.depth_check(*depth)?;
                let value = self.stack.remove(len - 1 - usize::from(*depth));
                self.stack.push(value);
            }
            (OP_CONCAT, _) => {
                let b = self.pop_bytes()?;
                let mut a = self.pop_bytes()?;
                a.extend_from_slice(&b);
                self.push(a)?;
            }
            (OP_SUBSTRING, InstrArgs::U8x2(start, end)) => {
                let data = self.pop_bytes()?;
                let slice = self.slice(&data, u64::from(*start), u64::from(*end))?;
                self.push(slice)?;
            }
            (OP_SUBSTRING3, _) => {
                let end = self.pop_uint()?;
                let start = self.pop_uint()?;
                let data = self.pop_bytes()?;
                let slice = self.slice(&data, start, end)?;
                self.push(slice)?;
            }
            (OP_EXTRACT, InstrArgs::U8x2(start, len)) => {
                let data = self.pop_bytes()?;
                let start = u64::from(*start);
                // A zero length extracts through the end.
                let end = if *len == 0 {
                    (data.len() as u64).max(start)
                } else {
                    start + u64::from(*len)
                };
                let slice = self.slice(&data, start, end)?;
                self.push(slice)?;
            }
            (OP_EXTRACT3, _) => {
                let len = self.pop_uint()?;
                let start = self.pop_uint()?;
                let data = self.pop_bytes()?;
                let end = start.checked_add(len).unwrap_or(u64::MAX);
                let slice = self.slice(&data, start, end)?;
                self.push(slice)?;
            }
            (OP_EXTRACT_UINT16 | OP_EXTRACT_UINT32 | OP_EXTRACT_UINT64, _) => {
                let width = match instr.op.opcode {
                    OP_EXTRACT_UINT16 => 2,
                    OP_EXTRACT_UINT32 => 4,
                    _ => 8,
                };
                let start = self.pop_uint()?;
                let data = self.pop_bytes()?;
                let end = start.checked_add(width).unwrap_or(u64::MAX);
                let slice = self.slice(&data, start, end)?;
                let value = slice.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
                self.push(value)?;
            }
            (OP_PUSHBYTES, InstrArgs::Bytes(data)) => self.push(data.clone())?,
            (OP_PUSHINT, InstrArgs::Uint(value)) => self.push(*value)?,
            (opcode, args) => {
                unreachable!("opcode {opcode:#04x} decoded with mismatched immediates {args:?}")
            }
        }
        Ok(Flow::Next)
    }

    // ===== Stack helpers =====

    fn overflow(&self) -> EvalError {
        EvalError::Overflow {
            op: self.op,
            pc: self.pc,
        }
    }

    fn div_zero(&self) -> EvalError {
        EvalError::DivideByZero {
            op: self.op,
            pc: self.pc,
        }
    }

    fn type_mismatch(&self, expected: &'static str) -> EvalError {
        EvalError::TypeMismatch {
            op: self.op,
            pc: self.pc,
            expected,
        }
    }

    fn shift_amount(&self, amount: u64) -> Result<u32, EvalError> {
        if amount >= 64 {
            return Err(EvalError::ShiftTooLarge {
                op: self.op,
                pc: self.pc,
                amount,
            });
        }
        Ok(amount as u32)
    }

    fn push(&mut self, value: impl Into<StackValue>) -> Result<(), EvalError> {
        let value = value.into();
        if let StackValue::Bytes(b) = &value
            && b.len() > MAX_BYTES_LEN
        {
            return Err(EvalError::BytesTooLong {
                op: self.op,
                pc: self.pc,
                len: b.len(),
            });
        }
        if self.stack.len() >= MAX_STACK_DEPTH {
            return Err(EvalError::StackOverflow {
                op: self.op,
                pc: self.pc,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<StackValue, EvalError> {
        self.stack.pop().ok_or(EvalError::StackUnderflow {
            op: self.op,
            pc: self.pc,
        })
    }

    fn pop_uint(&mut self) -> Result<u64, EvalError> {
        match self.pop()? {
            StackValue::Uint(v) => Ok(v),
            StackValue::Bytes(_) => Err(self.type_mismatch("uint64")),
        }
    }

    fn pop_bytes(&mut self) -> Result<Vec<u8>, EvalError> {
        match self.pop()? {
            StackValue::Bytes(b) => Ok(b),
            StackValue::Uint(_) => Err(self.type_mismatch("[]byte")),
        }
    }

    /// Ensure at least `depth + 1` values are present; returns the height.
    fn depth_check(&self, depth: u8) -> Result<usize, EvalError> {
        let height = self.stack.len();
        if usize::from(depth) >= height {
            if height == 0 {
                return Err(EvalError::StackUnderflow {
                    op: self.op,
                    pc: self.pc,
                });
            }
            return Err(EvalError::DepthOutOfRange {
                op: self.op,
                pc: self.pc,
                depth,
                height,
            });
        }
        Ok(height)
    }

    fn peek(&self, depth: u8) -> Result<StackValue, EvalError> {
        let height = self.depth_check(depth)?;
        Ok(self.stack[height - 1 - usize::from(depth)].clone())
    }

    fn arith<F>(&mut self, f: F) -> Result<(), EvalError>
    where
        F: FnOnce(&Self, u64, u64) -> Result<u64, EvalError>,
    {
        let b = self.pop_uint()?;
        let a = self.pop_uint()?;
        let result = f(self, a, b)?;
        self.push(result)
    }

    fn slice(&self, data: &[u8], start: u64, end: u64) -> Result<Vec<u8>, EvalError> {
        if start > end || end > data.len() as u64 {
            return Err(EvalError::RangeOutOfBounds {
                op: self.op,
                pc: self.pc,
                start,
                end,
                len: data.len(),
            });
        }
        Ok(data[start as usize..end as usize].to_vec())
    }

    // ===== Constants, arguments and fields =====

    fn push_int_const(&mut self, index: usize) -> Result<(), EvalError> {
        let value = self
            .int_consts
            .get(index)
            .copied()
            .ok_or(EvalError::ConstantIndex {
                op: self.op,
                pc: self.pc,
                index,
                len: self.int_consts.len(),
            })?;
        self.push(value)
    }

    fn push_byte_const(&mut self, index: usize) -> Result<(), EvalError> {
        let value = self
            .byte_consts
            .get(index)
            .cloned()
            .ok_or(EvalError::ConstantIndex {
                op: self.op,
                pc: self.pc,
                index,
                len: self.byte_consts.len(),
            })?;
        self.push(value)
    }

    fn push_arg(&mut self, index: usize) -> Result<(), EvalError> {
        let txn = self.group_txn(self.params.group_index)?;
        let value = txn
            .lsig
            .args
            .get(index)
            .cloned()
            .ok_or(EvalError::ArgIndex {
                op: self.op,
                pc: self.pc,
                index,
                count: txn.lsig.args.len(),
            })?;
        self.push(value)
    }

    fn group_txn(&self, index: usize) -> Result<&'a crate::SignedTxn, EvalError> {
        let params: &'a EvalParams = self.params;
        params.txn_group.get(index).ok_or(EvalError::GroupIndex {
            op: self.op,
            pc: self.pc,
            index,
            size: params.txn_group.len(),
        })
    }

    fn invalid_field(&self, field: u8) -> EvalError {
        EvalError::InvalidField {
            op: self.op,
            pc: self.pc,
            field,
        }
    }

    fn txn_field(&self, index: usize, id: u8) -> Result<StackValue, EvalError> {
        let field = txn_field_for(id, self.version).ok_or_else(|| self.invalid_field(id))?;
        let txn = &self.group_txn(index)?.txn;
        Ok(match field {
            TxnField::Sender => txn.sender.as_bytes().to_vec().into(),
            TxnField::Fee => txn.fee.into(),
            TxnField::FirstValid => txn.first_valid.into(),
            TxnField::LastValid => txn.last_valid.into(),
            TxnField::Note => txn.note.clone().into(),
            TxnField::Receiver => txn.receiver.as_bytes().to_vec().into(),
            TxnField::Amount => txn.amount.into(),
            TxnField::Type => txn.kind.as_str().as_bytes().to_vec().into(),
            TxnField::TypeEnum => txn.kind.type_enum().into(),
            TxnField::GroupIndex => (index as u64).into(),
            TxnField::ApplicationId => txn.application_id.into(),
        })
    }

    fn global_field(&self, id: u8) -> Result<StackValue, EvalError> {
        let field = global_field_for(id, self.version).ok_or_else(|| self.invalid_field(id))?;
        let proto = &self.params.proto;
        let ledger = |f: &'static str| {
            self.params.ledger.ok_or(EvalError::LedgerUnavailable {
                pc: self.pc,
                field: f,
            })
        };
        Ok(match field {
            GlobalField::MinTxnFee => proto.min_txn_fee.into(),
            GlobalField::MinBalance => proto.min_balance.into(),
            GlobalField::MaxTxnLife => proto.max_txn_life.into(),
            GlobalField::ZeroAddress => vec![0u8; 32].into(),
            GlobalField::GroupSize => (self.params.txn_group.len() as u64).into(),
            GlobalField::LogicSigVersion => proto.logic_sig_version.into(),
            GlobalField::Round => ledger(field.name())?.round.into(),
            GlobalField::LatestTimestamp => ledger(field.name())?.latest_timestamp.into(),
        })
    }
}

/// Transaction field for `id`, if readable at `version`.
pub(crate) fn txn_field_for(id: u8, version: u64) -> Option<TxnField> {
    TxnField::from_id(id).filter(|f| f.version() <= version)
}

/// Global field for `id`, if readable at `version`.
pub(crate) fn global_field_for(id: u8, version: u64) -> Option<GlobalField> {
    GlobalField::from_id(id).filter(|f| f.version() <= version)
}

fn bytes_bitlen(data: &[u8]) -> u64 {
    match data.iter().position(|&b| b != 0) {
        Some(i) => {
            let rest = (data.len() - i - 1) as u64 * 8;
            rest + u64::from(8 - data[i].leading_zeros())
        }
        None => 0,
    }
}
