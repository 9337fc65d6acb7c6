//! Instruction decoder.

use thiserror::Error;

use crate::encode::read_uvarint;
use crate::{BACKWARD_BRANCH_VERSION, ImmKind, MAX_LOGIC_VERSION, OpSpec, op_spec};

/// Decoding failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("program is empty")]
    EmptyProgram,
    #[error("invalid version encoding")]
    InvalidVersion,
    #[error("program version {version} is not supported (1..={max})")]
    UnsupportedVersion { version: u64, max: u64 },
    #[error("pc {pc} is outside the program")]
    PcOutOfRange { pc: usize },
    #[error("invalid opcode {opcode:#04x} at pc {pc}")]
    InvalidOpcode { opcode: u8, pc: usize },
    #[error("{name} at pc {pc} requires version {required}, program is version {version}")]
    OpcodeVersion {
        name: &'static str,
        pc: usize,
        required: u64,
        version: u64,
    },
    #[error("{name} at pc {pc}: immediate runs past end of program")]
    TruncatedImmediate { name: &'static str, pc: usize },
    #[error("{name} at pc {pc}: invalid uvarint immediate")]
    InvalidVarint { name: &'static str, pc: usize },
    #[error("{name} at pc {pc}: branch target {target} is outside the program")]
    BranchOutOfBounds {
        name: &'static str,
        pc: usize,
        target: i64,
    },
}

/// Decoded instruction with all immediates extracted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedInstr {
    pub op: &'static OpSpec,
    /// Offset of the opcode byte.
    pub pc: usize,
    /// Encoded size including immediates.
    pub size: usize,
    pub args: InstrArgs,
}

impl DecodedInstr {
    /// Offset of the following instruction.
    pub const fn next_pc(&self) -> usize {
        self.pc + self.size
    }

    /// Resolved branch target, if this is a branch.
    pub const fn branch_target(&self) -> Option<usize> {
        match self.args {
            InstrArgs::Branch { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// Immediate operands, one variant per [`ImmKind`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstrArgs {
    None,
    U8(u8),
    U8x2(u8, u8),
    Uint(u64),
    Bytes(Vec<u8>),
    UintBlock(Vec<u64>),
    BytesBlock(Vec<Vec<u8>>),
    /// Raw offset and absolute target (target may equal program length).
    Branch { offset: i32, target: usize },
}

/// Read the leading version uvarint.
///
/// Returns the version and the offset of the first instruction.
pub fn read_version(program: &[u8]) -> Result<(u64, usize), DecodeError> {
    if program.is_empty() {
        return Err(DecodeError::EmptyProgram);
    }
    let (version, len) = read_uvarint(program).ok_or(DecodeError::InvalidVersion)?;
    if version == 0 || version > MAX_LOGIC_VERSION {
        return Err(DecodeError::UnsupportedVersion {
            version,
            max: MAX_LOGIC_VERSION,
        });
    }
    Ok((version, len))
}

struct Cursor<'a> {
    program: &'a [u8],
    pos: usize,
    name: &'static str,
    pc: usize,
}

impl Cursor<'_> {
    fn truncated(&self) -> DecodeError {
        DecodeError::TruncatedImmediate {
            name: self.name,
            pc: self.pc,
        }
    }

    fn remaining(&self) -> usize {
        self.program.len() - self.pos
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        let byte = *self.program.get(self.pos).ok_or_else(|| self.truncated())?;
        self.pos += 1;
        Ok(byte)
    }

    fn uvarint(&mut self) -> Result<u64, DecodeError> {
        if self.pos >= self.program.len() {
            return Err(self.truncated());
        }
        let (value, len) =
            read_uvarint(&self.program[self.pos..]).ok_or(DecodeError::InvalidVarint {
                name: self.name,
                pc: self.pc,
            })?;
        self.pos += len;
        Ok(value)
    }

    /// Read a uvarint that counts items still to come, bounded by what is left.
    fn count(&mut self) -> Result<usize, DecodeError> {
        let count = self.uvarint()?;
        match usize::try_from(count) {
            Ok(count) if count <= self.remaining() => Ok(count),
            _ => Err(self.truncated()),
        }
    }

    fn take(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        if len > self.remaining() {
            return Err(self.truncated());
        }
        let bytes = self.program[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(bytes)
    }
}

/// Decode the instruction at `pc` for a program of the given version.
pub fn decode(program: &[u8], pc: usize, version: u64) -> Result<DecodedInstr, DecodeError> {
    let opcode = *program.get(pc).ok_or(DecodeError::PcOutOfRange { pc })?;
    let op = op_spec(opcode).ok_or(DecodeError::InvalidOpcode { opcode, pc })?;
    if op.version > version {
        return Err(DecodeError::OpcodeVersion {
            name: op.name,
            pc,
            required: op.version,
            version,
        });
    }

    let mut cur = Cursor {
        program,
        pos: pc + 1,
        name: op.name,
        pc,
    };

    let args = match op.imm {
        ImmKind::None => InstrArgs::None,
        ImmKind::U8 => InstrArgs::U8(cur.u8()?),
        ImmKind::U8x2 => {
            let first = cur.u8()?;
            InstrArgs::U8x2(first, cur.u8()?)
        }
        ImmKind::Uint => InstrArgs::Uint(cur.uvarint()?),
        ImmKind::Bytes => {
            let len = cur.count()?;
            InstrArgs::Bytes(cur.take(len)?)
        }
        ImmKind::UintBlock => {
            let count = cur.count()?;
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(cur.uvarint()?);
            }
            InstrArgs::UintBlock(values)
        }
        ImmKind::BytesBlock => {
            let count = cur.count()?;
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                let len = cur.count()?;
                values.push(cur.take(len)?);
            }
            InstrArgs::BytesBlock(values)
        }
        ImmKind::Branch => {
            let raw = u16::from_be_bytes([cur.u8()?, cur.u8()?]);
            let offset = if version >= BACKWARD_BRANCH_VERSION {
                i32::from(raw as i16)
            } else {
                i32::from(raw)
            };
            let target = cur.pos as i64 + i64::from(offset);
            if target < 0 || target > program.len() as i64 {
                return Err(DecodeError::BranchOutOfBounds {
                    name: op.name,
                    pc,
                    target,
                });
            }
            InstrArgs::Branch {
                offset,
                target: target as usize,
            }
        }
    };

    Ok(DecodedInstr {
        op,
        pc,
        size: cur.pos - pc,
        args,
    })
}

/// A fully decoded program.
#[derive(Clone, Debug)]
pub struct Program {
    pub version: u64,
    /// Offset of the first instruction (length of the version prefix).
    pub start: usize,
    /// Total encoded length, including the version prefix.
    pub len: usize,
    pub instrs: Vec<DecodedInstr>,
}

/// Decode every instruction of `program` in a linear sweep.
pub fn decode_program(program: &[u8]) -> Result<Program, DecodeError> {
    let (version, start) = read_version(program)?;
    let mut instrs = Vec::new();
    let mut pc = start;
    while pc < program.len() {
        let instr = decode(program, pc, version)?;
        pc = instr.next_pc();
        instrs.push(instr);
    }
    Ok(Program {
        version,
        start,
        len: program.len(),
        instrs,
    })
}
