//! Program disassembly for diagnostics.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::{
    DecodeError, DecodedInstr, GlobalField, InstrArgs, OP_GLOBAL, OP_GTXN, OP_TXN, TxnField,
    decode_program,
};

/// Disassemble a program into one instruction per line.
///
/// Branch targets are rendered as `labelN` in ascending address order.
pub fn disassemble(program: &[u8]) -> Result<String, DecodeError> {
    let decoded = decode_program(program)?;

    let mut labels = BTreeMap::new();
    for target in decoded.instrs.iter().filter_map(DecodedInstr::branch_target) {
        labels.entry(target).or_insert(0usize);
    }
    for (n, id) in labels.values_mut().enumerate() {
        *id = n + 1;
    }

    let mut out = String::new();
    let _ = writeln!(out, "#pragma version {}", decoded.version);
    for instr in &decoded.instrs {
        if let Some(id) = labels.get(&instr.pc) {
            let _ = writeln!(out, "label{id}:");
        }
        let _ = writeln!(out, "{}", format_instr(instr, &labels));
    }
    if let Some(id) = labels.get(&decoded.len) {
        let _ = writeln!(out, "label{id}:");
    }
    Ok(out)
}

fn txn_field_name(id: u8) -> String {
    TxnField::from_id(id).map_or_else(|| id.to_string(), |f| f.name().to_string())
}

/// Render a single instruction. Branches use the label map.
pub fn format_instr(instr: &DecodedInstr, labels: &BTreeMap<usize, usize>) -> String {
    let name = instr.op.name;
    match &instr.args {
        InstrArgs::None => name.to_string(),
        InstrArgs::U8(n) if instr.op.opcode == OP_TXN => {
            format!("{name} {}", txn_field_name(*n))
        }
        InstrArgs::U8(n) if instr.op.opcode == OP_GLOBAL => {
            let field = GlobalField::from_id(*n).map_or_else(|| n.to_string(), |f| f.name().into());
            format!("{name} {field}")
        }
        InstrArgs::U8(n) => format!("{name} {n}"),
        InstrArgs::U8x2(a, b) if instr.op.opcode == OP_GTXN => {
            format!("{name} {a} {}", txn_field_name(*b))
        }
        InstrArgs::U8x2(a, b) => format!("{name} {a} {b}"),
        InstrArgs::Uint(v) => format!("{name} {v}"),
        InstrArgs::Bytes(b) => format!("{name} 0x{}", hex::encode(b)),
        InstrArgs::UintBlock(values) => {
            let mut s = name.to_string();
            for v in values {
                let _ = write!(s, " {v}");
            }
            s
        }
        InstrArgs::BytesBlock(values) => {
            let mut s = name.to_string();
            for v in values {
                let _ = write!(s, " 0x{}", hex::encode(v));
            }
            s
        }
        InstrArgs::Branch { target, .. } => match labels.get(target) {
            Some(id) => format!("{name} label{id}"),
            None => format!("{name} @{target}"),
        },
    }
}
