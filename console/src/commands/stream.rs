//! File streaming between the terminal and the filesystem
//!
//! Upload: bytes typed on the terminal are collected in chunks and written
//! to a file until a byte at or below [`END_OF_INPUT`] arrives. Download: a
//! file is copied to the terminal chunk by chunk. In both directions the
//! file handle is closed on every exit path.

use embedded_io::{Read, Write};
use log::{debug, warn};

use crate::config::END_OF_INPUT;
use crate::fs::{FileSystem, FsError, FsResult, OpenMode};
use crate::terminal::Terminal;

/// Stream terminal input into `name`, creating or truncating it.
///
/// `chunk` sets the transfer size. A write that stores fewer bytes than
/// were offered means the volume is full and yields `Denied`. After that,
/// or after any other write failure, the failure is reported once and the
/// rest of the input is drained up to the terminator without writing.
pub fn upload<F, T>(fs: &mut F, term: &mut Terminal<T>, name: &str, chunk: &mut [u8]) -> FsResult<()>
where
    F: FileSystem,
    T: Read + Write,
{
    if chunk.is_empty() {
        return Err(FsError::InvalidParameter);
    }
    let mut file = fs
        .open_file(name, OpenMode::WRITE | OpenMode::CREATE_ALWAYS)
        .inspect_err(|err| cprintln!(term, "!! Cannot open {} ({})", name, err))?;

    let mut status = Ok(());
    let mut total = 0usize;
    loop {
        let fill = fill_chunk(term, chunk);
        if fill > 0 && status.is_ok() {
            match fs.write_file(&mut file, &chunk[..fill]) {
                Ok(written) if written < fill => {
                    warn!("{}: volume full after {} bytes", name, total + written);
                    cprintln!(term, "!! Card is full");
                    status = Err(FsError::Denied);
                }
                Ok(written) => {
                    total += written;
                    debug!("{}: wrote {} bytes", name, written);
                }
                Err(err) => {
                    cprintln!(term, "!! Cannot write to {} ({})", name, err);
                    status = Err(err);
                }
            }
        }
        if fill < chunk.len() {
            break;
        }
    }

    if let Err(err) = fs.close_file(file) {
        warn!("{}: close failed: {}", name, err);
        cprintln!(term, "!! Cannot close {} ({})", name, err);
        status = status.and(Err(err));
    }
    status
}

/// Collect input bytes into `chunk` until it is full, a terminator arrives
/// or the transport closes. Accepted bytes are echoed.
fn fill_chunk<T: Read + Write>(term: &mut Terminal<T>, chunk: &mut [u8]) -> usize {
    let mut fill = 0;
    while fill < chunk.len() {
        match term.get_char() {
            Some(c) if c > END_OF_INPUT => {
                chunk[fill] = c;
                fill += 1;
                term.put_char(c);
                term.flush();
            }
            _ => break,
        }
    }
    fill
}

/// Copy the contents of `name` to the terminal.
///
/// A read returning less than a full chunk marks the end of the file.
pub fn download<F, T>(fs: &mut F, term: &mut Terminal<T>, name: &str, chunk: &mut [u8]) -> FsResult<()>
where
    F: FileSystem,
    T: Write,
{
    if chunk.is_empty() {
        return Err(FsError::InvalidParameter);
    }
    let mut file = fs
        .open_file(name, OpenMode::READ)
        .inspect_err(|err| cprintln!(term, "!! Cannot open {} ({})", name, err))?;

    let mut status = Ok(());
    loop {
        match fs.read_file(&mut file, chunk) {
            Ok(n) => {
                term.put_bytes(&chunk[..n]);
                if n < chunk.len() {
                    break;
                }
            }
            Err(err) => {
                cprintln!(term, "!! Cannot read {} ({})", name, err);
                status = Err(err);
                break;
            }
        }
    }
    term.flush();

    if let Err(err) = fs.close_file(file) {
        warn!("{}: close failed: {}", name, err);
        cprintln!(term, "!! Cannot close {} ({})", name, err);
        status = status.and(Err(err));
    }
    status
}
