//! Image-file block device

use std::io::{self, Read, Seek, SeekFrom, Write};

use log::{debug, info};
use sdcon::config::{ERASED_BYTE, SECTOR_SIZE};
use sdcon::device::{sectors_in, BlockDevice, BlockError, TransferSpeed};

/// Card stand-in backed by a raw disk image
///
/// Capacity is fixed when the image is opened; trailing bytes that do not
/// fill a sector are not addressable.
pub struct ImageDisk<T> {
    io: T,
    sectors: u64,
    ready: bool,
}

impl<T: Read + Write + Seek> ImageDisk<T> {
    pub fn new(mut io: T) -> io::Result<Self> {
        let len = io.seek(SeekFrom::End(0))?;
        Ok(Self {
            io,
            sectors: len / SECTOR_SIZE as u64,
            ready: false,
        })
    }

    #[cfg(test)]
    pub fn into_inner(self) -> T {
        self.io
    }

    fn seek_to(&mut self, start_sector: u64, count: u64) -> Result<(), BlockError> {
        if !self.ready {
            return Err(BlockError::NotReady);
        }
        match start_sector.checked_add(count) {
            Some(end) if end <= self.sectors => {}
            _ => return Err(BlockError::InvalidSector),
        }
        self.io
            .seek(SeekFrom::Start(start_sector * SECTOR_SIZE as u64))
            .map_err(|_| BlockError::InvalidSector)?;
        Ok(())
    }
}

impl<T: Read + Write + Seek> BlockDevice for ImageDisk<T> {
    fn init(&mut self) -> Result<(), BlockError> {
        if self.sectors == 0 {
            return Err(BlockError::NotReady);
        }
        self.ready = true;
        info!("image disk: {} sectors", self.sectors);
        Ok(())
    }

    fn set_speed(&mut self, speed: TransferSpeed) {
        debug!("image disk: speed {:?}", speed);
    }

    fn sector_count(&mut self) -> Result<u64, BlockError> {
        if !self.ready {
            return Err(BlockError::NotReady);
        }
        Ok(self.sectors)
    }

    fn read(&mut self, start_sector: u64, buf: &mut [u8]) -> Result<(), BlockError> {
        self.seek_to(start_sector, sectors_in(buf.len())?)?;
        self.io.read_exact(buf).map_err(|_| BlockError::ReadFailed)
    }

    fn write(&mut self, start_sector: u64, buf: &[u8]) -> Result<usize, BlockError> {
        self.seek_to(start_sector, sectors_in(buf.len())?)?;
        self.io.write_all(buf).map_err(|_| BlockError::WriteFailed)?;
        self.io.flush().map_err(|_| BlockError::WriteFailed)?;
        Ok(buf.len())
    }

    fn erase(&mut self, start_sector: u64, count: u64) -> Result<(), BlockError> {
        self.seek_to(start_sector, count)?;
        let blank = [ERASED_BYTE; SECTOR_SIZE];
        for _ in 0..count {
            self.io.write_all(&blank).map_err(|_| BlockError::EraseFailed)?;
        }
        self.io.flush().map_err(|_| BlockError::EraseFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_capacity_from_length() {
        let mut disk = ImageDisk::new(Cursor::new(vec![0u8; SECTOR_SIZE * 3 + 100])).unwrap();
        let mut buf = [0u8; SECTOR_SIZE];
        assert_eq!(disk.read(0, &mut buf), Err(BlockError::NotReady));
        assert_eq!(disk.sector_count(), Err(BlockError::NotReady));
        disk.init().unwrap();
        assert_eq!(disk.sector_count(), Ok(3));
    }

    #[test]
    fn test_write_read_erase() {
        let mut disk = ImageDisk::new(Cursor::new(vec![0u8; SECTOR_SIZE * 4])).unwrap();
        disk.init().unwrap();

        let pattern: Vec<u8> = (0..SECTOR_SIZE).map(|i| i as u8).collect();
        assert_eq!(disk.write(1, &pattern), Ok(SECTOR_SIZE));
        let mut buf = [0u8; SECTOR_SIZE];
        disk.read(1, &mut buf).unwrap();
        assert_eq!(&buf[..], &pattern[..]);

        disk.erase(1, 2).unwrap();
        assert_eq!(disk.erase(3, 2), Err(BlockError::InvalidSector));
        let image = disk.into_inner().into_inner();
        assert!(image[..SECTOR_SIZE].iter().all(|&b| b == 0));
        assert!(image[SECTOR_SIZE..SECTOR_SIZE * 3].iter().all(|&b| b == ERASED_BYTE));
        assert!(image[SECTOR_SIZE * 3..].iter().all(|&b| b == 0));
    }
}
