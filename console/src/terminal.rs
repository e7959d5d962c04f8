//! Operator terminal
//!
//! Wraps a raw `embedded_io` byte transport (a UART on the target, stdio on
//! the host) with the byte-level and formatted helpers the consoles use.
//! Output errors are dropped: a serial console has nobody to report them to.

use core::fmt;

use embedded_io::{Read, Write};

/// Print formatted text on a [`Terminal`]
macro_rules! cprint {
    ($term:expr, $($arg:tt)*) => ({
        $term.print(core::format_args!($($arg)*));
    });
}

/// Print formatted text and a newline on a [`Terminal`]
macro_rules! cprintln {
    ($term:expr) => ($term.put_char(b'\n'));
    ($term:expr, $fmt:expr $(, $($arg:tt)*)?) => ({
        $term.print(core::format_args!(concat!($fmt, "\n") $(, $($arg)*)?));
    });
}

/// Blocking character terminal over a byte transport
pub struct Terminal<T> {
    io: T,
    closed: bool,
}

impl<T> Terminal<T> {
    pub const fn new(io: T) -> Self {
        Self { io, closed: false }
    }

    /// True once the input side reported end-of-stream or an error
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn io(&self) -> &T {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut T {
        &mut self.io
    }

    pub fn into_inner(self) -> T {
        self.io
    }
}

impl<T: Read> Terminal<T> {
    /// Block until one byte arrives.
    ///
    /// Returns `None` when the transport is closed or failed; every later
    /// call returns `None` without touching the transport again.
    pub fn get_char(&mut self) -> Option<u8> {
        if self.closed {
            return None;
        }
        let mut byte = [0u8; 1];
        match self.io.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => {
                self.closed = true;
                None
            }
        }
    }
}

impl<T: Write> Terminal<T> {
    pub fn put_char(&mut self, byte: u8) {
        let _ = self.io.write_all(&[byte]);
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        let _ = self.io.write_all(bytes);
    }

    pub fn print(&mut self, args: fmt::Arguments<'_>) {
        let _ = fmt::Write::write_fmt(self, args);
    }

    pub fn flush(&mut self) {
        let _ = self.io.flush();
    }
}

impl<T: Write> fmt::Write for Terminal<T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.put_bytes(s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedIo;

    #[test]
    fn test_get_char_until_closed() {
        let mut term = Terminal::new(ScriptedIo::new(b"ab"));
        assert_eq!(term.get_char(), Some(b'a'));
        assert_eq!(term.get_char(), Some(b'b'));
        assert!(!term.is_closed());
        assert_eq!(term.get_char(), None);
        assert!(term.is_closed());
        assert_eq!(term.get_char(), None);
    }

    #[test]
    fn test_print_macros() {
        let mut term = Terminal::new(ScriptedIo::new(b""));
        cprint!(term, "{}-{}", 1, 2);
        cprintln!(term, " x={:02x}", 10);
        cprintln!(term);
        assert_eq!(term.io().output_str(), "1-2 x=0a\n\n");
    }
}
