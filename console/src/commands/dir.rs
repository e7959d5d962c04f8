//! Single-shot directory and file commands

use embedded_io::Write;
use log::warn;

use crate::fs::{FileSystem, FsResult};
use crate::terminal::Terminal;

/// Print every entry of `path`: `[name]` for directories, name and size for files
pub fn list<F: FileSystem, T: Write>(fs: &mut F, term: &mut Terminal<T>, path: &str) -> FsResult<()> {
    let mut dir = fs
        .open_dir(path)
        .inspect_err(|err| cprintln!(term, "!! Cannot open {} ({})", path, err))?;

    let mut status = Ok(());
    loop {
        match fs.read_dir(&mut dir) {
            Ok(Some(entry)) if entry.is_dir() => cprintln!(term, "[{:<12}]", entry.name.as_str()),
            Ok(Some(entry)) => cprintln!(term, "{:<12} {:10}", entry.name.as_str(), entry.size),
            Ok(None) => break,
            Err(err) => {
                cprintln!(term, "!! Cannot read {} ({})", path, err);
                status = Err(err);
                break;
            }
        }
    }

    if let Err(err) = fs.close_dir(dir) {
        warn!("{}: close failed: {}", path, err);
        cprintln!(term, "!! Cannot close {} ({})", path, err);
        status = status.and(Err(err));
    }
    status
}

pub fn make<F: FileSystem, T: Write>(fs: &mut F, term: &mut Terminal<T>, path: &str) -> FsResult<()> {
    match fs.make_dir(path) {
        Ok(()) => {
            cprintln!(term, "Created directory {}", path);
            Ok(())
        }
        Err(err) => {
            cprintln!(term, "!! Cannot make {} ({})", path, err);
            Err(err)
        }
    }
}

/// Remove a file or an empty directory
pub fn remove<F: FileSystem, T: Write>(fs: &mut F, term: &mut Terminal<T>, path: &str) -> FsResult<()> {
    fs.unlink(path)
        .inspect_err(|err| cprintln!(term, "!! Cannot remove {} ({})", path, err))
}

pub fn change<F: FileSystem, T: Write>(fs: &mut F, term: &mut Terminal<T>, path: &str) -> FsResult<()> {
    fs.change_dir(path)
        .inspect_err(|err| cprintln!(term, "!! Cannot change current dir to {} ({})", path, err))
}
