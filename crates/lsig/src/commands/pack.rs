//! Pack command.

use std::path::Path;

use lsig::FuzzInput;
use tracing::error;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal;

/// Handle the `pack` command.
pub fn cmd_pack(program: &str, args: &[String], output: &Path) -> i32 {
    match pack(program, args, output) {
        Ok(len) => {
            terminal::finished("Packed", &format!("{len} bytes to {}", output.display()));
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(error = %e, "pack failed");
            EXIT_FAILURE
        }
    }
}

fn pack(program: &str, args: &[String], output: &Path) -> lsig::Result<usize> {
    let program = parse_hex(program)?;
    let args = args
        .iter()
        .map(|arg| parse_hex(arg))
        .collect::<Result<Vec<_>, _>>()?;
    let bytes = FuzzInput::new(program, args).to_bytes()?;
    std::fs::write(output, &bytes)?;
    Ok(bytes.len())
}

fn parse_hex(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let text = text.trim();
    hex::decode(text.strip_prefix("0x").unwrap_or(text))
}
