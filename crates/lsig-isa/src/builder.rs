//! Programmatic program construction with label fixups.

use std::collections::HashMap;

use thiserror::Error;

use crate::encode::write_uvarint;
use crate::{BACKWARD_BRANCH_VERSION, OP_BYTECBLOCK, OP_INTCBLOCK, OP_PUSHBYTES, OP_PUSHINT};

/// Program construction error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("branch to undefined label `{0}`")]
    UnknownLabel(&'static str),
    #[error("branch to `{label}` needs offset {offset}, which does not fit")]
    OffsetOutOfRange { label: &'static str, offset: i64 },
}

struct Fixup {
    /// Position of the two offset bytes.
    at: usize,
    label: &'static str,
}

/// Builder that emits encoded program bytes.
pub struct ProgramBuilder {
    version: u64,
    bytes: Vec<u8>,
    labels: HashMap<&'static str, usize>,
    fixups: Vec<Fixup>,
}

impl ProgramBuilder {
    /// Start a program with the given version prefix.
    pub fn new(version: u64) -> Self {
        let mut bytes = Vec::new();
        write_uvarint(&mut bytes, version);
        Self {
            version,
            bytes,
            labels: HashMap::new(),
            fixups: Vec::new(),
        }
    }

    /// Emit an opcode without immediates.
    #[must_use]
    pub fn op(mut self, opcode: u8) -> Self {
        self.bytes.push(opcode);
        self
    }

    #[must_use]
    pub fn op_u8(mut self, opcode: u8, imm: u8) -> Self {
        self.bytes.extend_from_slice(&[opcode, imm]);
        self
    }

    #[must_use]
    pub fn op_u8x2(mut self, opcode: u8, a: u8, b: u8) -> Self {
        self.bytes.extend_from_slice(&[opcode, a, b]);
        self
    }

    #[must_use]
    pub fn push_int(mut self, value: u64) -> Self {
        self.bytes.push(OP_PUSHINT);
        write_uvarint(&mut self.bytes, value);
        self
    }

    #[must_use]
    pub fn push_bytes(mut self, value: &[u8]) -> Self {
        self.bytes.push(OP_PUSHBYTES);
        write_uvarint(&mut self.bytes, value.len() as u64);
        self.bytes.extend_from_slice(value);
        self
    }

    #[must_use]
    pub fn int_block(mut self, values: &[u64]) -> Self {
        self.bytes.push(OP_INTCBLOCK);
        write_uvarint(&mut self.bytes, values.len() as u64);
        for &v in values {
            write_uvarint(&mut self.bytes, v);
        }
        self
    }

    #[must_use]
    pub fn bytes_block(mut self, values: &[&[u8]]) -> Self {
        self.bytes.push(OP_BYTECBLOCK);
        write_uvarint(&mut self.bytes, values.len() as u64);
        for v in values {
            write_uvarint(&mut self.bytes, v.len() as u64);
            self.bytes.extend_from_slice(v);
        }
        self
    }

    /// Define a label at the current position.
    #[must_use]
    pub fn label(mut self, name: &'static str) -> Self {
        self.labels.insert(name, self.bytes.len());
        self
    }

    /// Emit a branching opcode whose target is resolved at build time.
    #[must_use]
    pub fn branch(mut self, opcode: u8, label: &'static str) -> Self {
        self.bytes.push(opcode);
        self.fixups.push(Fixup {
            at: self.bytes.len(),
            label,
        });
        self.bytes.extend_from_slice(&[0, 0]);
        self
    }

    /// Emit raw bytes verbatim.
    #[must_use]
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Resolve labels and return the encoded program.
    pub fn build(mut self) -> Result<Vec<u8>, BuildError> {
        for fixup in &self.fixups {
            let target = *self
                .labels
                .get(fixup.label)
                .ok_or(BuildError::UnknownLabel(fixup.label))?;
            let offset = target as i64 - (fixup.at + 2) as i64;
            let raw = if self.version >= BACKWARD_BRANCH_VERSION {
                i16::try_from(offset).map(|o| o as u16).ok()
            } else {
                u16::try_from(offset).ok()
            };
            let raw = raw.ok_or(BuildError::OffsetOutOfRange {
                label: fixup.label,
                offset,
            })?;
            self.bytes[fixup.at..fixup.at + 2].copy_from_slice(&raw.to_be_bytes());
        }
        Ok(self.bytes)
    }
}
