//! Filesystem result codes
//!
//! Closed set of failures a filesystem collaborator reports. Numeric codes
//! follow the FatFs `FRESULT` numbering so reports read the same as on other
//! FAT stacks; 0 (`OK`) is the `Ok` side of [`FsResult`].

use core::fmt;

use crate::device::BlockError;

/// Filesystem error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FsError {
    /// Hard error in the low level disk layer
    DiskErr = 1,
    /// Assertion failure inside the filesystem engine
    IntErr = 2,
    /// The physical drive does not work
    NotReady = 3,
    /// Could not find the file
    NoFile = 4,
    /// Could not find the path
    NoPath = 5,
    /// The path name format is invalid
    InvalidName = 6,
    /// Access denied or directory full
    Denied = 7,
    /// Object already exists
    Exist = 8,
    /// File or directory handle is invalid
    InvalidObject = 9,
    /// The physical drive is write protected
    WriteProtected = 10,
    /// The logical drive number is invalid
    InvalidDrive = 11,
    /// The volume has no work area
    NotEnabled = 12,
    /// No valid FAT volume
    NoFileSystem = 13,
    /// Format aborted
    MkfsAborted = 14,
    /// Could not get volume access in time
    Timeout = 15,
    /// Operation rejected by the file sharing policy
    Locked = 16,
    /// Working buffer could not be allocated
    NotEnoughCore = 17,
    /// Too many files open at once
    TooManyOpenFiles = 18,
    /// Given parameter is invalid
    InvalidParameter = 19,
}

/// Result of a filesystem operation
pub type FsResult<T> = Result<T, FsError>;

impl FsError {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            FsError::DiskErr => "DISK_ERR",
            FsError::IntErr => "INT_ERR",
            FsError::NotReady => "NOT_READY",
            FsError::NoFile => "NO_FILE",
            FsError::NoPath => "NO_PATH",
            FsError::InvalidName => "INVALID_NAME",
            FsError::Denied => "DENIED",
            FsError::Exist => "EXIST",
            FsError::InvalidObject => "INVALID_OBJECT",
            FsError::WriteProtected => "WRITE_PROTECTED",
            FsError::InvalidDrive => "INVALID_DRIVE",
            FsError::NotEnabled => "NOT_ENABLED",
            FsError::NoFileSystem => "NO_FILE_SYSTEM",
            FsError::MkfsAborted => "MKFS_ABORTED",
            FsError::Timeout => "TIMEOUT",
            FsError::Locked => "LOCKED",
            FsError::NotEnoughCore => "NOT_ENOUGH_CORE",
            FsError::TooManyOpenFiles => "TOO_MANY_OPEN_FILES",
            FsError::InvalidParameter => "INVALID_PARAMETER",
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<BlockError> for FsError {
    fn from(err: BlockError) -> Self {
        match err {
            BlockError::NotReady => FsError::NotReady,
            BlockError::Timeout => FsError::Timeout,
            BlockError::InvalidSector | BlockError::BufferSize => FsError::InvalidParameter,
            BlockError::ReadFailed | BlockError::WriteFailed | BlockError::EraseFailed => {
                FsError::DiskErr
            }
        }
    }
}
