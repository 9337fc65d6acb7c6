//! Logic signature instruction set definitions and decoder.
//!
//! This crate provides the opcode table, instruction decoding, and
//! disassembly for the stack-based transaction logic language. Program
//! semantics live in `lsig-eval`; nothing here executes code.

mod builder;
mod decode;
mod disasm;
mod encode;
mod types;

pub use builder::{BuildError, ProgramBuilder};
pub use decode::{
    DecodeError, DecodedInstr, InstrArgs, Program, decode, decode_program, read_version,
};
pub use disasm::{disassemble, format_instr};
pub use encode::{MAX_UVARINT_LEN, read_uvarint, write_uvarint};
pub use types::*;
