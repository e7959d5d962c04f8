//! Filesystem collaborator interface
//!
//! The console never touches on-disk structures. Everything it knows about
//! a volume comes through [`FileSystem`], which a FAT engine on the target or
//! a host adapter implements.

use bitflags::bitflags;
use heapless::String;

use super::error::FsResult;
use super::path::{bounded, PathBuf};
use crate::config::{LABEL_CAPACITY, NAME_CAPACITY};

bitflags! {
    /// Directory entry attribute bits (FAT layout)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN = 0x02;
        const SYSTEM = 0x04;
        const DIRECTORY = 0x10;
        const ARCHIVE = 0x20;
    }
}

bitflags! {
    /// File open mode
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenMode: u8 {
        /// Data can be read
        const READ = 0x01;
        /// Data can be written
        const WRITE = 0x02;
        /// Create a new file, failing with `Exist` if it is there
        const CREATE_NEW = 0x04;
        /// Create a new file, truncating an existing one
        const CREATE_ALWAYS = 0x08;
        /// Open the file, creating it if missing
        const OPEN_ALWAYS = 0x10;
    }
}

/// Information about a file or directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String<NAME_CAPACITY>,
    /// Size in bytes, 0 for directories
    pub size: u32,
    pub attributes: Attributes,
}

impl FileInfo {
    pub fn new(name: &str, size: u32, attributes: Attributes) -> Self {
        Self {
            name: bounded(name),
            size,
            attributes,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.attributes.contains(Attributes::DIRECTORY)
    }
}

/// FAT variant of a mounted volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatType {
    Fat12,
    Fat16,
    Fat32,
    ExFat,
}

impl FatType {
    pub const fn as_str(self) -> &'static str {
        match self {
            FatType::Fat12 => "FAT12",
            FatType::Fat16 => "FAT16",
            FatType::Fat32 => "FAT32",
            FatType::ExFat => "exFAT",
        }
    }
}

/// Geometry and usage of a mounted volume
///
/// Region offsets are absolute sector numbers. `dir_start` is the root
/// directory sector on FAT12/16 and the root directory cluster on FAT32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeInfo {
    pub fat_type: FatType,
    pub sectors_per_cluster: u32,
    pub fat_count: u32,
    pub root_entries: u32,
    pub sectors_per_fat: u32,
    pub cluster_count: u32,
    pub free_clusters: u32,
    pub volume_start: u64,
    pub fat_start: u64,
    pub dir_start: u64,
    pub data_start: u64,
}

/// Volume label and serial number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeLabel {
    pub label: String<LABEL_CAPACITY>,
    pub serial: u32,
}

/// Abstract filesystem interface
///
/// Paths are relative to the current directory unless they start with `/`.
/// Directory and file handles are consumed by their close call.
pub trait FileSystem {
    /// Open directory handle
    type Dir;
    /// Open file handle
    type File;

    /// Mount the volume at `root`
    fn mount(&mut self, root: &str) -> FsResult<()>;

    /// Geometry and free space of the mounted volume
    fn volume_info(&mut self, root: &str) -> FsResult<VolumeInfo>;

    fn volume_label(&mut self, root: &str) -> FsResult<VolumeLabel>;

    fn open_dir(&mut self, path: &str) -> FsResult<Self::Dir>;

    /// Next entry of `dir`, or `None` once the directory is exhausted
    ///
    /// The `.` and `..` entries are never returned.
    fn read_dir(&mut self, dir: &mut Self::Dir) -> FsResult<Option<FileInfo>>;

    fn close_dir(&mut self, dir: Self::Dir) -> FsResult<()>;

    fn change_dir(&mut self, path: &str) -> FsResult<()>;

    /// Absolute path of the current directory
    fn current_dir(&mut self) -> FsResult<PathBuf>;

    fn make_dir(&mut self, path: &str) -> FsResult<()>;

    /// Remove a file or an empty directory
    fn unlink(&mut self, path: &str) -> FsResult<()>;

    fn open_file(&mut self, path: &str, mode: OpenMode) -> FsResult<Self::File>;

    /// Read into `buf`, returning the byte count (0 at end of file)
    fn read_file(&mut self, file: &mut Self::File, buf: &mut [u8]) -> FsResult<usize>;

    /// Write `buf`, returning how many bytes were stored
    ///
    /// A count below `buf.len()` means the volume is full.
    fn write_file(&mut self, file: &mut Self::File, buf: &[u8]) -> FsResult<usize>;

    fn close_file(&mut self, file: Self::File) -> FsResult<()>;
}
