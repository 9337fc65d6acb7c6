//! Unsigned varint encoding used for versions and immediates.

/// Maximum encoded length of a 64-bit uvarint.
pub const MAX_UVARINT_LEN: usize = 10;

/// Read a uvarint from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed, or `None` when the
/// input is truncated or the value overflows 64 bits.
pub fn read_uvarint(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for (i, &byte) in bytes.iter().enumerate() {
        if i == MAX_UVARINT_LEN {
            return None;
        }
        if byte < 0x80 {
            if i == MAX_UVARINT_LEN - 1 && byte > 1 {
                return None;
            }
            return Some((value | (u64::from(byte) << shift), i + 1));
        }
        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }
    None
}

/// Append `value` as a uvarint.
pub fn write_uvarint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}
