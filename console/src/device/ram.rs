//! RAM-backed block device

use super::block::{sectors_in, BlockDevice, BlockError, TransferSpeed};
use crate::config::{ERASED_BYTE, SECTOR_SIZE};

/// Block device over a borrowed byte slice
///
/// Behaves like a card: every operation fails with `NotReady` until
/// [`BlockDevice::init`] has run.
pub struct RamDisk<'a> {
    data: &'a mut [u8],
    ready: bool,
    speed: TransferSpeed,
}

impl<'a> RamDisk<'a> {
    /// Wrap `data`; trailing bytes that do not fill a sector are ignored
    pub fn new(data: &'a mut [u8]) -> Self {
        Self {
            data,
            ready: false,
            speed: TransferSpeed::default(),
        }
    }

    pub fn speed(&self) -> TransferSpeed {
        self.speed
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    fn sectors(&self) -> u64 {
        (self.data.len() / SECTOR_SIZE) as u64
    }

    fn span(&self, start_sector: u64, count: u64) -> Result<core::ops::Range<usize>, BlockError> {
        if !self.ready {
            return Err(BlockError::NotReady);
        }
        let end = start_sector
            .checked_add(count)
            .filter(|&end| end <= self.sectors())
            .ok_or(BlockError::InvalidSector)?;
        Ok(start_sector as usize * SECTOR_SIZE..end as usize * SECTOR_SIZE)
    }
}

impl BlockDevice for RamDisk<'_> {
    fn init(&mut self) -> Result<(), BlockError> {
        if self.sectors() == 0 {
            return Err(BlockError::NotReady);
        }
        self.ready = true;
        Ok(())
    }

    fn set_speed(&mut self, speed: TransferSpeed) {
        self.speed = speed;
    }

    fn sector_count(&mut self) -> Result<u64, BlockError> {
        if !self.ready {
            return Err(BlockError::NotReady);
        }
        Ok(self.sectors())
    }

    fn read(&mut self, start_sector: u64, buf: &mut [u8]) -> Result<(), BlockError> {
        let range = self.span(start_sector, sectors_in(buf.len())?)?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write(&mut self, start_sector: u64, buf: &[u8]) -> Result<usize, BlockError> {
        let range = self.span(start_sector, sectors_in(buf.len())?)?;
        self.data[range].copy_from_slice(buf);
        Ok(buf.len())
    }

    fn erase(&mut self, start_sector: u64, count: u64) -> Result<(), BlockError> {
        let range = self.span(start_sector, count)?;
        self.data[range].fill(ERASED_BYTE);
        Ok(())
    }
}
