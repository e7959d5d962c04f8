//! Block device abstraction
//!
//! Sector-addressed storage (SD/SDHC cards, disk images). Sectors are
//! [`SECTOR_SIZE`] bytes and buffers passed in must be a multiple of that.

use core::fmt;

use crate::config::SECTOR_SIZE;

/// Block device error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockError {
    /// Device not ready or not present
    NotReady,
    /// Invalid sector number
    InvalidSector,
    /// Read operation failed
    ReadFailed,
    /// Write operation failed
    WriteFailed,
    /// Erase operation failed
    EraseFailed,
    /// Device I/O timeout
    Timeout,
    /// Buffer size mismatch
    BufferSize,
}

impl BlockError {
    /// Numeric code, as reported by card drivers (0 is success)
    pub const fn code(self) -> u8 {
        match self {
            BlockError::NotReady => 1,
            BlockError::InvalidSector => 2,
            BlockError::ReadFailed => 3,
            BlockError::WriteFailed => 4,
            BlockError::EraseFailed => 5,
            BlockError::Timeout => 6,
            BlockError::BufferSize => 7,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            BlockError::NotReady => "NOT_READY",
            BlockError::InvalidSector => "INVALID_SECTOR",
            BlockError::ReadFailed => "READ_FAILED",
            BlockError::WriteFailed => "WRITE_FAILED",
            BlockError::EraseFailed => "ERASE_FAILED",
            BlockError::Timeout => "TIMEOUT",
            BlockError::BufferSize => "BUFFER_SIZE",
        }
    }
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.as_str())
    }
}

/// Bus clock profile used for subsequent transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferSpeed {
    /// Full data-transfer clock
    #[default]
    Fast,
    /// Identification-mode clock, for marginal wiring
    Slow,
}

/// Block device trait
///
/// Implemented by storage drivers. Calls block until the device answers.
pub trait BlockDevice {
    /// Bring the device up (card identification, bus setup)
    fn init(&mut self) -> Result<(), BlockError>;

    /// Select the clock profile for later transfers
    ///
    /// Transfers already in flight are not affected.
    fn set_speed(&mut self, _speed: TransferSpeed) {}

    /// Get total number of sectors
    fn sector_count(&mut self) -> Result<u64, BlockError>;

    /// Get sector size (always 512 bytes for SD cards)
    fn sector_size(&self) -> usize {
        SECTOR_SIZE
    }

    /// Read sectors from the device
    ///
    /// # Arguments
    /// * `start_sector` - First sector to read
    /// * `buf` - Buffer to read into (must be multiple of 512 bytes)
    fn read(&mut self, start_sector: u64, buf: &mut [u8]) -> Result<(), BlockError>;

    /// Write sectors to the device
    ///
    /// Returns the number of bytes the device accepted.
    fn write(&mut self, start_sector: u64, buf: &[u8]) -> Result<usize, BlockError>;

    /// Erase `count` sectors starting at `start_sector`
    fn erase(&mut self, start_sector: u64, count: u64) -> Result<(), BlockError>;
}

/// Validate a transfer buffer and return how many sectors it spans
pub fn sectors_in(buf_len: usize) -> Result<u64, BlockError> {
    if buf_len == 0 || buf_len % SECTOR_SIZE != 0 {
        return Err(BlockError::BufferSize);
    }
    Ok((buf_len / SECTOR_SIZE) as u64)
}
