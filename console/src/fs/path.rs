//! Path handling

use heapless::String;

use super::error::{FsError, FsResult};
use crate::config::PATH_CAPACITY;

/// Absolute path, bounded to [`PATH_CAPACITY`] bytes
pub type PathBuf = String<PATH_CAPACITY>;

/// Copy `s` into a bounded string, truncating at a char boundary if needed
pub fn bounded<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Resolve `path` against the absolute directory `cwd`.
///
/// `.` and empty components are dropped, `..` removes the previous
/// component and stops at the root. Fails with `InvalidName` when the result
/// does not fit a [`PathBuf`].
pub fn resolve(cwd: &str, path: &str) -> FsResult<PathBuf> {
    let base = if path.starts_with('/') { "" } else { cwd };

    let mut out = PathBuf::new();
    for component in base.split('/').chain(path.split('/')) {
        match component {
            "" | "." => {}
            ".." => {
                while let Some(c) = out.pop() {
                    if c == '/' {
                        break;
                    }
                }
            }
            name => {
                out.push('/').map_err(|_| FsError::InvalidName)?;
                out.push_str(name).map_err(|_| FsError::InvalidName)?;
            }
        }
    }
    if out.is_empty() {
        out.push('/').map_err(|_| FsError::InvalidName)?;
    }
    Ok(out)
}
