//! Directory tree walker
//!
//! Depth-first listing of a directory tree without recursion. The walk keeps
//! a fixed-capacity stack of open directory handles, one frame per level of
//! the current path, and moves the filesystem's current directory along
//! with it:
//!
//! - frame `i` is open while the walk is at depth `i` or below
//! - the filesystem's current directory is always the directory of the top
//!   frame, so every entry name read from it can be opened as-is
//! - a frame is closed, and the current directory moved up one level, as
//!   soon as its directory has no more entries or fails to read
//!
//! The stack capacity `H` bounds both memory and the listed depth:
//! directories at depth `H - 1` are printed but not entered.
//!
//! ## Output
//!
//! ```text
//! a.txt        100
//! sub
//!   b.txt          5
//! ```

use embedded_io::Write;
use heapless::Vec;
use log::{debug, warn};

use crate::config::MAX_TREE_HEIGHT;
use crate::fs::{FileSystem, FsError, FsResult};
use crate::terminal::Terminal;

/// Root argument that walks the current directory in place
pub const CURRENT_DIR: &str = ".";

/// What a walk saw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Subdirectories listed, entered or not
    pub directories: usize,
    pub files: usize,
    /// Failures reported on the terminal along the way
    pub errors: usize,
}

/// Walk `root` with the default height bound
pub fn tree<F: FileSystem, T: Write>(fs: &mut F, term: &mut Terminal<T>, root: &str) -> FsResult<WalkSummary> {
    walk::<F, T, MAX_TREE_HEIGHT>(fs, term, root)
}

/// Walk `root`, printing one line per entry indented by two spaces a level.
///
/// Fails only when `root` cannot be opened and entered, or when `H` is 0.
/// Errors deeper in the tree are reported and skipped; the walk always
/// unwinds every frame it opened. On return the current directory is one
/// level above `root`, or unchanged when `root` is `.`; for a single
/// component below the current directory that is where the walk started.
pub fn walk<F, T, const H: usize>(fs: &mut F, term: &mut Terminal<T>, root: &str) -> FsResult<WalkSummary>
where
    F: FileSystem,
    T: Write,
{
    if H == 0 {
        return Err(FsError::InvalidParameter);
    }

    let mut frames: Vec<F::Dir, H> = Vec::new();
    let mut summary = WalkSummary::default();

    let dir = enter(fs, term, root)?;
    if let Err(dir) = frames.push(dir) {
        leave(fs, term, dir, root, 0, &mut summary);
        return Err(FsError::InvalidParameter);
    }

    while let Some(depth) = frames.len().checked_sub(1) {
        let indent = depth * 2;

        match fs.read_dir(&mut frames[depth]) {
            Ok(Some(entry)) if entry.is_dir() => {
                summary.directories += 1;
                cprintln!(term, "{:indent$}{}", "", entry.name.as_str(), indent = indent);
                if depth + 1 >= H {
                    continue;
                }
                match enter(fs, term, &entry.name) {
                    Ok(dir) => {
                        debug!("tree: enter {} at depth {}", entry.name, depth + 1);
                        if let Err(dir) = frames.push(dir) {
                            leave(fs, term, dir, root, depth + 1, &mut summary);
                        }
                    }
                    Err(_) => summary.errors += 1,
                }
            }
            Ok(Some(entry)) => {
                summary.files += 1;
                cprintln!(term, "{:indent$}{} {:10}", "", entry.name.as_str(), entry.size, indent = indent);
            }
            Ok(None) => {
                if let Some(dir) = frames.pop() {
                    leave(fs, term, dir, root, depth, &mut summary);
                }
            }
            Err(err) => {
                cprintln!(term, "!! Cannot read cwd ({})", err);
                summary.errors += 1;
                if let Some(dir) = frames.pop() {
                    leave(fs, term, dir, root, depth, &mut summary);
                }
            }
        }
    }

    debug!(
        "tree: {} dirs, {} files, {} errors",
        summary.directories, summary.files, summary.errors
    );
    Ok(summary)
}

/// Open `name` and make it the current directory
fn enter<F: FileSystem, T: Write>(fs: &mut F, term: &mut Terminal<T>, name: &str) -> FsResult<F::Dir> {
    let dir = fs
        .open_dir(name)
        .inspect_err(|err| cprintln!(term, "!! Cannot open {} ({})", name, err))?;

    if let Err(err) = fs.change_dir(name) {
        cprintln!(term, "!! Cannot change current dir to {} ({})", name, err);
        if let Err(close_err) = fs.close_dir(dir) {
            warn!("tree: closing {} after failed chdir: {}", name, close_err);
        }
        return Err(err);
    }
    Ok(dir)
}

/// Close the frame at `depth` and step the current directory back up
fn leave<F: FileSystem, T: Write>(
    fs: &mut F,
    term: &mut Terminal<T>,
    dir: F::Dir,
    root: &str,
    depth: usize,
    summary: &mut WalkSummary,
) {
    if let Err(err) = fs.close_dir(dir) {
        warn!("tree: close at depth {}: {}", depth, err);
        cprintln!(term, "!! Cannot close cwd ({})", err);
        summary.errors += 1;
    }
    if depth > 0 || root != CURRENT_DIR {
        if let Err(err) = fs.change_dir("..") {
            cprintln!(term, "!! Cannot change cwd to .. ({})", err);
            summary.errors += 1;
        }
    }
    debug!("tree: leave depth {}", depth);
}
