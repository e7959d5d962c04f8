//! Line reader
//!
//! Blocking, echo-on-input acquisition of one command line into a bounded
//! buffer. Printable bytes are stored and echoed as they arrive, backspace
//! and delete rub out the last stored byte, every other control byte is
//! dropped. `\n` ends the line and is not stored.

use embedded_io::{Read, Write};

use crate::terminal::Terminal;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7F;

/// The transport closed before any byte of a new line arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputClosed;

/// Read one line into `buf`.
///
/// At most `buf.len() - 1` bytes are stored; the slot after the last stored
/// byte is always set to 0. Reading stops at `\n` or as soon as the buffer
/// is full, in which case the rest of the input is left for the next call.
/// A newline is echoed once the line is complete.
///
/// Returns the number of bytes stored. `Err(InputClosed)` is returned only
/// when the transport closes with nothing stored; a partial line cut short
/// by the close is returned as a normal line.
pub fn read_line<T: Read + Write>(
    term: &mut Terminal<T>,
    buf: &mut [u8],
) -> Result<usize, InputClosed> {
    let Some(limit) = buf.len().checked_sub(1) else {
        return Ok(0);
    };

    let mut len = 0;
    while len < limit {
        let Some(c) = term.get_char() else {
            if len == 0 {
                buf[0] = 0;
                return Err(InputClosed);
            }
            break;
        };
        match c {
            b'\n' => break,
            BACKSPACE | DELETE => {
                if len > 0 {
                    len -= 1;
                    term.put_bytes(b"\x08 \x08");
                }
            }
            c if c >= b' ' => {
                buf[len] = c;
                len += 1;
                term.put_char(c);
            }
            _ => {}
        }
        term.flush();
    }
    buf[len] = 0;
    term.put_char(b'\n');
    term.flush();
    Ok(len)
}
