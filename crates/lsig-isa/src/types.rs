//! Core types for the logic signature instruction set.

use std::fmt;
use std::sync::LazyLock;

/// Highest program version understood by the decoder.
pub const MAX_LOGIC_VERSION: u64 = 5;

/// First version with signed branch offsets and subroutines.
pub const BACKWARD_BRANCH_VERSION: u64 = 4;

/// Immediate operand layout following an opcode byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImmKind {
    /// No immediates.
    None,
    /// One byte.
    U8,
    /// Two bytes.
    U8x2,
    /// One uvarint.
    Uint,
    /// uvarint length followed by that many bytes.
    Bytes,
    /// uvarint count followed by that many uvarints.
    UintBlock,
    /// uvarint count followed by that many length-prefixed byte strings.
    BytesBlock,
    /// Two-byte big-endian offset relative to the end of the instruction.
    Branch,
}

/// Static description of one opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpSpec {
    pub opcode: u8,
    pub name: &'static str,
    pub imm: ImmKind,
    /// First program version in which the opcode is available.
    pub version: u64,
    /// Static cost charged by the checker and the evaluator.
    pub cost: u64,
}

impl OpSpec {
    const fn new(opcode: u8, name: &'static str, imm: ImmKind, version: u64, cost: u64) -> Self {
        Self {
            opcode,
            name,
            imm,
            version,
            cost,
        }
    }
}

impl fmt::Display for OpSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ===== Opcode constants =====

pub const OP_ERR: u8 = 0x00;
pub const OP_SHA256: u8 = 0x01;
pub const OP_KECCAK256: u8 = 0x02;
pub const OP_SHA512_256: u8 = 0x03;
pub const OP_ADD: u8 = 0x08;
pub const OP_SUB: u8 = 0x09;
pub const OP_DIV: u8 = 0x0a;
pub const OP_MUL: u8 = 0x0b;
pub const OP_LT: u8 = 0x0c;
pub const OP_GT: u8 = 0x0d;
pub const OP_LE: u8 = 0x0e;
pub const OP_GE: u8 = 0x0f;
pub const OP_AND: u8 = 0x10;
pub const OP_OR: u8 = 0x11;
pub const OP_EQ: u8 = 0x12;
pub const OP_NEQ: u8 = 0x13;
pub const OP_NOT: u8 = 0x14;
pub const OP_LEN: u8 = 0x15;
pub const OP_ITOB: u8 = 0x16;
pub const OP_BTOI: u8 = 0x17;
pub const OP_MOD: u8 = 0x18;
pub const OP_BITOR: u8 = 0x19;
pub const OP_BITAND: u8 = 0x1a;
pub const OP_BITXOR: u8 = 0x1b;
pub const OP_BITNOT: u8 = 0x1c;
pub const OP_MULW: u8 = 0x1d;
pub const OP_INTCBLOCK: u8 = 0x20;
pub const OP_INTC: u8 = 0x21;
pub const OP_INTC_0: u8 = 0x22;
pub const OP_INTC_1: u8 = 0x23;
pub const OP_INTC_2: u8 = 0x24;
pub const OP_INTC_3: u8 = 0x25;
pub const OP_BYTECBLOCK: u8 = 0x26;
pub const OP_BYTEC: u8 = 0x27;
pub const OP_BYTEC_0: u8 = 0x28;
pub const OP_BYTEC_1: u8 = 0x29;
pub const OP_BYTEC_2: u8 = 0x2a;
pub const OP_BYTEC_3: u8 = 0x2b;
pub const OP_ARG: u8 = 0x2c;
pub const OP_ARG_0: u8 = 0x2d;
pub const OP_ARG_1: u8 = 0x2e;
pub const OP_ARG_2: u8 = 0x2f;
pub const OP_ARG_3: u8 = 0x30;
pub const OP_TXN: u8 = 0x31;
pub const OP_GLOBAL: u8 = 0x32;
pub const OP_GTXN: u8 = 0x33;
pub const OP_BNZ: u8 = 0x40;
pub const OP_BZ: u8 = 0x41;
pub const OP_B: u8 = 0x42;
pub const OP_RETURN: u8 = 0x43;
pub const OP_ASSERT: u8 = 0x44;
pub const OP_POP: u8 = 0x48;
pub const OP_DUP: u8 = 0x49;
pub const OP_DUP2: u8 = 0x4a;
pub const OP_DIG: u8 = 0x4b;
pub const OP_SWAP: u8 = 0x4c;
pub const OP_SELECT: u8 = 0x4d;
pub const OP_COVER: u8 = 0x4e;
pub const OP_UNCOVER: u8 = 0x4f;
pub const OP_CONCAT: u8 = 0x50;
pub const OP_SUBSTRING: u8 = 0x51;
pub const OP_SUBSTRING3: u8 = 0x52;
pub const OP_EXTRACT: u8 = 0x57;
pub const OP_EXTRACT3: u8 = 0x58;
pub const OP_EXTRACT_UINT16: u8 = 0x59;
pub const OP_EXTRACT_UINT32: u8 = 0x5a;
pub const OP_EXTRACT_UINT64: u8 = 0x5b;
pub const OP_PUSHBYTES: u8 = 0x80;
pub const OP_PUSHINT: u8 = 0x81;
pub const OP_CALLSUB: u8 = 0x88;
pub const OP_RETSUB: u8 = 0x89;
pub const OP_SHL: u8 = 0x90;
pub const OP_SHR: u8 = 0x91;
pub const OP_SQRT: u8 = 0x92;
pub const OP_BITLEN: u8 = 0x93;

/// Every opcode the decoder accepts.
pub static OP_SPECS: &[OpSpec] = &[
    OpSpec::new(OP_ERR, "err", ImmKind::None, 1, 1),
    OpSpec::new(OP_SHA256, "sha256", ImmKind::None, 1, 35),
    OpSpec::new(OP_KECCAK256, "keccak256", ImmKind::None, 1, 130),
    OpSpec::new(OP_SHA512_256, "sha512_256", ImmKind::None, 1, 45),
    OpSpec::new(OP_ADD, "+", ImmKind::None, 1, 1),
    OpSpec::new(OP_SUB, "-", ImmKind::None, 1, 1),
    OpSpec::new(OP_DIV, "/", ImmKind::None, 1, 1),
    OpSpec::new(OP_MUL, "*", ImmKind::None, 1, 1),
    OpSpec::new(OP_LT, "<", ImmKind::None, 1, 1),
    OpSpec::new(OP_GT, ">", ImmKind::None, 1, 1),
    OpSpec::new(OP_LE, "<=", ImmKind::None, 1, 1),
    OpSpec::new(OP_GE, ">=", ImmKind::None, 1, 1),
    OpSpec::new(OP_AND, "&&", ImmKind::None, 1, 1),
    OpSpec::new(OP_OR, "||", ImmKind::None, 1, 1),
    OpSpec::new(OP_EQ, "==", ImmKind::None, 1, 1),
    OpSpec::new(OP_NEQ, "!=", ImmKind::None, 1, 1),
    OpSpec::new(OP_NOT, "!", ImmKind::None, 1, 1),
    OpSpec::new(OP_LEN, "len", ImmKind::None, 1, 1),
    OpSpec::new(OP_ITOB, "itob", ImmKind::None, 1, 1),
    OpSpec::new(OP_BTOI, "btoi", ImmKind::None, 1, 1),
    OpSpec::new(OP_MOD, "%", ImmKind::None, 1, 1),
    OpSpec::new(OP_BITOR, "|", ImmKind::None, 1, 1),
    OpSpec::new(OP_BITAND, "&", ImmKind::None, 1, 1),
    OpSpec::new(OP_BITXOR, "^", ImmKind::None, 1, 1),
    OpSpec::new(OP_BITNOT, "~", ImmKind::None, 1, 1),
    OpSpec::new(OP_MULW, "mulw", ImmKind::None, 1, 1),
    OpSpec::new(OP_INTCBLOCK, "intcblock", ImmKind::UintBlock, 1, 1),
    OpSpec::new(OP_INTC, "intc", ImmKind::U8, 1, 1),
    OpSpec::new(OP_INTC_0, "intc_0", ImmKind::None, 1, 1),
    OpSpec::new(OP_INTC_1, "intc_1", ImmKind::None, 1, 1),
    OpSpec::new(OP_INTC_2, "intc_2", ImmKind::None, 1, 1),
    OpSpec::new(OP_INTC_3, "intc_3", ImmKind::None, 1, 1),
    OpSpec::new(OP_BYTECBLOCK, "bytecblock", ImmKind::BytesBlock, 1, 1),
    OpSpec::new(OP_BYTEC, "bytec", ImmKind::U8, 1, 1),
    OpSpec::new(OP_BYTEC_0, "bytec_0", ImmKind::None, 1, 1),
    OpSpec::new(OP_BYTEC_1, "bytec_1", ImmKind::None, 1, 1),
    OpSpec::new(OP_BYTEC_2, "bytec_2", ImmKind::None, 1, 1),
    OpSpec::new(OP_BYTEC_3, "bytec_3", ImmKind::None, 1, 1),
    OpSpec::new(OP_ARG, "arg", ImmKind::U8, 1, 1),
    OpSpec::new(OP_ARG_0, "arg_0", ImmKind::None, 1, 1),
    OpSpec::new(OP_ARG_1, "arg_1", ImmKind::None, 1, 1),
    OpSpec::new(OP_ARG_2, "arg_2", ImmKind::None, 1, 1),
    OpSpec::new(OP_ARG_3, "arg_3", ImmKind::None, 1, 1),
    OpSpec::new(OP_TXN, "txn", ImmKind::U8, 1, 1),
    OpSpec::new(OP_GLOBAL, "global", ImmKind::U8, 1, 1),
    OpSpec::new(OP_GTXN, "gtxn", ImmKind::U8x2, 1, 1),
    OpSpec::new(OP_BNZ, "bnz", ImmKind::Branch, 1, 1),
    OpSpec::new(OP_BZ, "bz", ImmKind::Branch, 2, 1),
    OpSpec::new(OP_B, "b", ImmKind::Branch, 2, 1),
    OpSpec::new(OP_RETURN, "return", ImmKind::None, 2, 1),
    OpSpec::new(OP_ASSERT, "assert", ImmKind::None, 3, 1),
    OpSpec::new(OP_POP, "pop", ImmKind::None, 1, 1),
    OpSpec::new(OP_DUP, "dup", ImmKind::None, 1, 1),
    OpSpec::new(OP_DUP2, "dup2", ImmKind::None, 2, 1),
    OpSpec::new(OP_DIG, "dig", ImmKind::U8, 3, 1),
    OpSpec::new(OP_SWAP, "swap", ImmKind::None, 3, 1),
    OpSpec::new(OP_SELECT, "select", ImmKind::None, 3, 1),
    OpSpec::new(OP_COVER, "cover", ImmKind::U8, 5, 1),
    OpSpec::new(OP_UNCOVER, "uncover", ImmKind::U8, 5, 1),
    OpSpec::new(OP_CONCAT, "concat", ImmKind::None, 2, 1),
    OpSpec::new(OP_SUBSTRING, "substring", ImmKind::U8x2, 2, 1),
    OpSpec::new(OP_SUBSTRING3, "substring3", ImmKind::None, 2, 1),
    OpSpec::new(OP_EXTRACT, "extract", ImmKind::U8x2, 5, 1),
    OpSpec::new(OP_EXTRACT3, "extract3", ImmKind::None, 5, 1),
    OpSpec::new(OP_EXTRACT_UINT16, "extract_uint16", ImmKind::None, 5, 1),
    OpSpec::new(OP_EXTRACT_UINT32, "extract_uint32", ImmKind::None, 5, 1),
    OpSpec::new(OP_EXTRACT_UINT64, "extract_uint64", ImmKind::None, 5, 1),
    OpSpec::new(OP_PUSHBYTES, "pushbytes", ImmKind::Bytes, 3, 1),
    OpSpec::new(OP_PUSHINT, "pushint", ImmKind::Uint, 3, 1),
    OpSpec::new(OP_CALLSUB, "callsub", ImmKind::Branch, 4, 1),
    OpSpec::new(OP_RETSUB, "retsub", ImmKind::None, 4, 1),
    OpSpec::new(OP_SHL, "shl", ImmKind::None, 4, 1),
    OpSpec::new(OP_SHR, "shr", ImmKind::None, 4, 1),
    OpSpec::new(OP_SQRT, "sqrt", ImmKind::None, 4, 4),
    OpSpec::new(OP_BITLEN, "bitlen", ImmKind::None, 4, 1),
];

static OP_TABLE: LazyLock<[Option<&'static OpSpec>; 256]> = LazyLock::new(|| {
    let mut table = [None; 256];
    for spec in OP_SPECS {
        table[usize::from(spec.opcode)] = Some(spec);
    }
    table
});

/// Look up the spec for an opcode byte, regardless of version.
pub fn op_spec(opcode: u8) -> Option<&'static OpSpec> {
    OP_TABLE[usize::from(opcode)]
}

// ===== Field tables =====

/// Transaction field readable through `txn` and `gtxn`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxnField {
    Sender,
    Fee,
    FirstValid,
    LastValid,
    Note,
    Receiver,
    Amount,
    Type,
    TypeEnum,
    GroupIndex,
    ApplicationId,
}

impl TxnField {
    pub const ALL: [Self; 11] = [
        Self::Sender,
        Self::Fee,
        Self::FirstValid,
        Self::LastValid,
        Self::Note,
        Self::Receiver,
        Self::Amount,
        Self::Type,
        Self::TypeEnum,
        Self::GroupIndex,
        Self::ApplicationId,
    ];

    /// Numeric field id as encoded in the immediate.
    pub const fn id(self) -> u8 {
        match self {
            Self::Sender => 0,
            Self::Fee => 1,
            Self::FirstValid => 2,
            Self::LastValid => 4,
            Self::Note => 5,
            Self::Receiver => 7,
            Self::Amount => 8,
            Self::Type => 15,
            Self::TypeEnum => 16,
            Self::GroupIndex => 22,
            Self::ApplicationId => 24,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sender => "Sender",
            Self::Fee => "Fee",
            Self::FirstValid => "FirstValid",
            Self::LastValid => "LastValid",
            Self::Note => "Note",
            Self::Receiver => "Receiver",
            Self::Amount => "Amount",
            Self::Type => "Type",
            Self::TypeEnum => "TypeEnum",
            Self::GroupIndex => "GroupIndex",
            Self::ApplicationId => "ApplicationID",
        }
    }

    /// First version in which the field can be read.
    pub const fn version(self) -> u64 {
        match self {
            Self::ApplicationId => 2,
            _ => 1,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.id() == id)
    }
}

/// Global field readable through `global`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GlobalField {
    MinTxnFee,
    MinBalance,
    MaxTxnLife,
    ZeroAddress,
    GroupSize,
    LogicSigVersion,
    Round,
    LatestTimestamp,
}

impl GlobalField {
    pub const ALL: [Self; 8] = [
        Self::MinTxnFee,
        Self::MinBalance,
        Self::MaxTxnLife,
        Self::ZeroAddress,
        Self::GroupSize,
        Self::LogicSigVersion,
        Self::Round,
        Self::LatestTimestamp,
    ];

    pub const fn id(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::MinTxnFee => "MinTxnFee",
            Self::MinBalance => "MinBalance",
            Self::MaxTxnLife => "MaxTxnLife",
            Self::ZeroAddress => "ZeroAddress",
            Self::GroupSize => "GroupSize",
            Self::LogicSigVersion => "LogicSigVersion",
            Self::Round => "Round",
            Self::LatestTimestamp => "LatestTimestamp",
        }
    }

    pub const fn version(self) -> u64 {
        match self {
            Self::LogicSigVersion | Self::Round | Self::LatestTimestamp => 2,
            _ => 1,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }
}
