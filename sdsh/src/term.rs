//! Stdio transport for the console terminal

use std::io::{self, Read as _, Write as _};

use embedded_io::{ErrorKind, ErrorType, Read, Write};

/// `embedded_io` byte transport over the process' stdin and stdout
pub struct StdTerminal {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl StdTerminal {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
        }
    }
}

fn kind(err: io::Error) -> ErrorKind {
    match err.kind() {
        io::ErrorKind::Interrupted => ErrorKind::Interrupted,
        io::ErrorKind::BrokenPipe => ErrorKind::BrokenPipe,
        io::ErrorKind::WriteZero => ErrorKind::WriteZero,
        _ => ErrorKind::Other,
    }
}

impl ErrorType for StdTerminal {
    type Error = ErrorKind;
}

impl Read for StdTerminal {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.stdin.lock().read(buf).map_err(kind)
    }
}

impl Write for StdTerminal {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stdout.lock().write(buf).map_err(kind)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stdout.lock().flush().map_err(kind)
    }
}
