//! Block exerciser
//!
//! Raw sector operations against the address register of the block console.
//! Address 0 means "unset": read, write and erase then do nothing, which
//! keeps a stray keystroke from touching the boot sector.

use embedded_io::Write;

use crate::config::{SECTOR_SIZE, SECTORS_PER_KIB};
use crate::device::{BlockDevice, BlockError};
use crate::dump;
use crate::terminal::Terminal;

pub fn init<D: BlockDevice, T: Write>(dev: &mut D, term: &mut Terminal<T>) -> Result<(), BlockError> {
    dev.init().inspect_err(|err| cprintln!(term, "!init error: {}", err))
}

/// Print the device capacity; the caller reports failures
pub fn show_size<D: BlockDevice, T: Write>(dev: &mut D, term: &mut Terminal<T>) -> Result<u64, BlockError> {
    let count = dev.sector_count()?;
    cprintln!(term, "Size: {} sect / {} KB", count, count / SECTORS_PER_KIB);
    Ok(count)
}

/// Read the sector at `address` into `buf` and dump it
pub fn read_sector<D: BlockDevice, T: Write>(
    dev: &mut D,
    term: &mut Terminal<T>,
    address: u32,
    buf: &mut [u8; SECTOR_SIZE],
) -> Result<(), BlockError> {
    if address == 0 {
        return Ok(());
    }
    dev.read(u64::from(address), buf)
        .inspect_err(|err| cprintln!(term, "!read error: {}", err))?;
    let _ = dump::write_sector(term, u64::from(address), buf);
    Ok(())
}

/// Fill `buf` with the test pattern (byte i = i mod 256) and write it at `address`
pub fn write_pattern<D: BlockDevice, T: Write>(
    dev: &mut D,
    term: &mut Terminal<T>,
    address: u32,
    buf: &mut [u8; SECTOR_SIZE],
) -> Result<(), BlockError> {
    if address == 0 {
        return Ok(());
    }
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = i as u8;
    }
    match dev.write(u64::from(address), buf) {
        Ok(n) if n == buf.len() => Ok(()),
        Ok(n) => {
            log::warn!("short sector write at {}: {} of {} bytes", address, n, buf.len());
            cprintln!(term, "!write error: {}", BlockError::WriteFailed);
            Err(BlockError::WriteFailed)
        }
        Err(err) => {
            cprintln!(term, "!write error: {}", err);
            Err(err)
        }
    }
}

pub fn erase_sector<D: BlockDevice, T: Write>(
    dev: &mut D,
    term: &mut Terminal<T>,
    address: u32,
) -> Result<(), BlockError> {
    if address == 0 {
        return Ok(());
    }
    dev.erase(u64::from(address), 1)
        .inspect_err(|err| cprintln!(term, "!erase error: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ERASED_BYTE;
    use crate::device::RamDisk;
    use crate::testing::ScriptedIo;

    fn term() -> Terminal<ScriptedIo> {
        Terminal::new(ScriptedIo::new(b""))
    }

    #[test]
    fn test_unset_address_is_noop() {
        let mut data = vec![0u8; SECTOR_SIZE * 8];
        let mut disk = RamDisk::new(&mut data);
        let mut term = term();
        let mut buf = [0u8; SECTOR_SIZE];
        init(&mut disk, &mut term).unwrap();

        assert_eq!(write_pattern(&mut disk, &mut term, 0, &mut buf), Ok(()));
        assert_eq!(erase_sector(&mut disk, &mut term, 0), Ok(()));
        assert_eq!(read_sector(&mut disk, &mut term, 0, &mut buf), Ok(()));
        assert_eq!(term.io().output_str(), "");
        assert!(disk.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_then_read_back() {
        let mut data = vec![0u8; SECTOR_SIZE * 8];
        let mut disk = RamDisk::new(&mut data);
        let mut term = term();
        let mut buf = [0u8; SECTOR_SIZE];
        init(&mut disk, &mut term).unwrap();

        write_pattern(&mut disk, &mut term, 3, &mut buf).unwrap();
        buf = [0u8; SECTOR_SIZE];
        read_sector(&mut disk, &mut term, 3, &mut buf).unwrap();
        assert_eq!(buf[0x41], 0x41);
        assert_eq!(buf[0x1ff], 0xff);

        let out = term.io().output_str();
        assert!(out.starts_with("# 3:\n000: 00 01 02 03"));
        assert_eq!(out.lines().count(), 33);
    }

    #[test]
    fn test_erase() {
        let mut data = vec![0u8; SECTOR_SIZE * 8];
        let mut disk = RamDisk::new(&mut data);
        let mut term = term();
        init(&mut disk, &mut term).unwrap();
        erase_sector(&mut disk, &mut term, 2).unwrap();
        let erased = &disk.data()[2 * SECTOR_SIZE..3 * SECTOR_SIZE];
        assert!(erased.iter().all(|&b| b == ERASED_BYTE));
    }

    #[test]
    fn test_errors_reported() {
        let mut data = vec![0u8; SECTOR_SIZE * 8];
        let mut disk = RamDisk::new(&mut data);
        let mut term = term();
        let mut buf = [0u8; SECTOR_SIZE];

        assert_eq!(
            read_sector(&mut disk, &mut term, 1, &mut buf),
            Err(BlockError::NotReady)
        );
        init(&mut disk, &mut term).unwrap();
        assert_eq!(
            write_pattern(&mut disk, &mut term, 100, &mut buf),
            Err(BlockError::InvalidSector)
        );
        assert_eq!(
            term.io().output_str(),
            "!read error: 1 (NOT_READY)\n!write error: 2 (INVALID_SECTOR)\n"
        );
    }

    #[test]
    fn test_size_report() {
        let mut data = vec![0u8; SECTOR_SIZE * 8];
        let mut disk = RamDisk::new(&mut data);
        let mut term = term();
        assert_eq!(show_size(&mut disk, &mut term), Err(BlockError::NotReady));
        init(&mut disk, &mut term).unwrap();
        assert_eq!(show_size(&mut disk, &mut term), Ok(8));
        assert_eq!(term.io().output_str(), "Size: 8 sect / 4 KB\n");
    }
}
