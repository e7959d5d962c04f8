//! Sector dump formatter
//!
//! Renders a sector as rows of 16 bytes: the row offset, the bytes in hex
//! grouped by four, then the same bytes as ASCII.
//!
//! ```text
//! # 8:
//! 000: 00 01 02 03  04 05 06 07  08 09 0a 0b  0c 0d 0e 0f  | ................
//! ```

use core::fmt;

const ROW_BYTES: usize = 16;
const GROUP_BYTES: usize = 4;

/// Write `data` as a hex dump labelled with `sector`
pub fn write_sector<W: fmt::Write>(out: &mut W, sector: u64, data: &[u8]) -> fmt::Result {
    writeln!(out, "# {}:", sector)?;
    for (row, bytes) in data.chunks(ROW_BYTES).enumerate() {
        write!(out, "{:03x}:", row * ROW_BYTES)?;
        for group in bytes.chunks(GROUP_BYTES) {
            for byte in group {
                write!(out, " {:02x}", byte)?;
            }
            out.write_char(' ')?;
        }
        out.write_str(" | ")?;
        for &byte in bytes {
            out.write_char(printable(byte))?;
        }
        out.write_char('\n')?;
    }
    Ok(())
}

fn printable(byte: u8) -> char {
    if (b' '..0x7F).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}
