//! Filesystem layer
//!
//! Result codes, the collaborator trait and path helpers shared by the
//! filesystem console and the filesystem adapters.

pub mod error;
pub mod path;
pub mod vfs;

pub use error::{FsError, FsResult};
pub use path::{bounded, resolve, PathBuf};
pub use vfs::{
    Attributes, FatType, FileInfo, FileSystem, OpenMode, VolumeInfo, VolumeLabel,
};
