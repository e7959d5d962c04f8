//! FAT volume adapter over the `fatfs` crate
//!
//! Implements the console's `FileSystem` collaborator for a disk image. The
//! volume is opened afresh for every operation and unmounted when it is
//! done, so each command leaves the image consistent on disk. The current
//! directory is kept here as an absolute path; handles are plain records of
//! a path and a position.

use std::io::{self, Read, Seek, SeekFrom, Write};

use log::{debug, info, warn};
use sdcon::config::SECTOR_SIZE;
use sdcon::fs::{
    bounded, resolve, Attributes, FatType, FileInfo, FileSystem, FsError, FsResult, OpenMode,
    PathBuf, VolumeInfo, VolumeLabel,
};

/// Run `$body` with `$fs` bound to the volume on `$disk`, then unmount it.
macro_rules! with_fs {
    ($disk:expr, |$fs:ident| $body:block) => {{
        let disk = $disk.as_mut().ok_or(FsError::NotEnabled)?;
        disk.seek(SeekFrom::Start(0)).map_err(map_io)?;
        let $fs = fatfs::FileSystem::new(disk, fatfs::FsOptions::new()).map_err(|err| {
            warn!("fat: volume unreadable: {}", err);
            FsError::NoFileSystem
        })?;
        let result: FsResult<_> = $body;
        $fs.unmount().map_err(map_io)?;
        result
    }};
}

/// Region layout decoded from the boot sector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub sectors_per_cluster: u32,
    pub fat_count: u32,
    pub root_entries: u32,
    pub sectors_per_fat: u32,
    pub fat_start: u64,
    /// Root directory sector (FAT12/16) or cluster (FAT32)
    pub dir_start: u64,
    pub data_start: u64,
}

impl Layout {
    /// Decode the BIOS parameter block; `None` if it is not a FAT boot sector
    pub fn parse(boot: &[u8; SECTOR_SIZE]) -> Option<Self> {
        let u16_at = |o: usize| u32::from(u16::from_le_bytes([boot[o], boot[o + 1]]));
        let u32_at = |o: usize| u32::from_le_bytes([boot[o], boot[o + 1], boot[o + 2], boot[o + 3]]);

        if boot[510..] != [0x55, 0xAA] {
            return None;
        }
        let bytes_per_sector = u16_at(11);
        let sectors_per_cluster = u32::from(boot[13]);
        let reserved = u16_at(14);
        let fat_count = u32::from(boot[16]);
        let root_entries = u16_at(17);
        let sectors_per_fat = match u16_at(22) {
            0 => u32_at(36),
            n => n,
        };
        if bytes_per_sector == 0 || sectors_per_cluster == 0 || fat_count == 0 {
            return None;
        }

        let fat_start = u64::from(reserved);
        let root_start = fat_start + u64::from(fat_count) * u64::from(sectors_per_fat);
        let root_sectors = (root_entries * 32).div_ceil(bytes_per_sector);
        // FAT32 keeps the root directory in the data area
        let dir_start = if root_entries == 0 {
            u64::from(u32_at(44))
        } else {
            root_start
        };
        Some(Self {
            sectors_per_cluster,
            fat_count,
            root_entries,
            sectors_per_fat,
            fat_start,
            dir_start,
            data_start: root_start + u64::from(root_sectors),
        })
    }
}

/// Listing taken when the directory was opened
pub struct FatDir {
    entries: std::vec::IntoIter<FsResult<FileInfo>>,
}

pub struct FatFile {
    path: String,
    pos: u64,
    mode: OpenMode,
}

/// `FileSystem` over a FAT image opened by `open` at mount time
pub struct FatVolume<T, O> {
    open: O,
    disk: Option<T>,
    layout: Option<Layout>,
    cwd: String,
}

impl<T, O> FatVolume<T, O>
where
    T: Read + Write + Seek,
    O: FnMut() -> io::Result<T>,
{
    pub fn new(open: O) -> Self {
        Self {
            open,
            disk: None,
            layout: None,
            cwd: String::from("/"),
        }
    }

    fn absolute(&self, path: &str) -> FsResult<String> {
        Ok(String::from(resolve(&self.cwd, path)?.as_str()))
    }
}

/// Path below the volume root, as `fatfs` expects it
fn relative(absolute: &str) -> &str {
    absolute.trim_start_matches('/')
}

fn is_dot(name: &str) -> bool {
    name == "." || name == ".."
}

fn map_io(err: io::Error) -> FsError {
    match err.kind() {
        io::ErrorKind::NotFound => FsError::NoFile,
        io::ErrorKind::AlreadyExists => FsError::Exist,
        io::ErrorKind::PermissionDenied => FsError::Denied,
        io::ErrorKind::InvalidInput => FsError::InvalidName,
        _ => FsError::DiskErr,
    }
}

/// Like [`map_io`], for lookups where a missing component is a missing path
fn map_path(err: io::Error) -> FsError {
    match err.kind() {
        io::ErrorKind::NotFound => FsError::NoPath,
        _ => map_io(err),
    }
}

fn is_volume_full(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::StorageFull || err.to_string().contains("No space")
}

impl<T, O> FileSystem for FatVolume<T, O>
where
    T: Read + Write + Seek,
    O: FnMut() -> io::Result<T>,
{
    type Dir = FatDir;
    type File = FatFile;

    fn mount(&mut self, root: &str) -> FsResult<()> {
        if !root.is_empty() && root != "/" {
            return Err(FsError::InvalidDrive);
        }
        self.disk = None;
        self.layout = None;

        let mut disk = (self.open)().map_err(|err| {
            warn!("fat: cannot open image: {}", err);
            FsError::NotReady
        })?;
        let mut boot = [0u8; SECTOR_SIZE];
        disk.seek(SeekFrom::Start(0))
            .and_then(|_| disk.read_exact(&mut boot))
            .map_err(|_| FsError::DiskErr)?;
        let layout = Layout::parse(&boot).ok_or(FsError::NoFileSystem)?;

        disk.seek(SeekFrom::Start(0)).map_err(map_io)?;
        let fs = fatfs::FileSystem::new(&mut disk, fatfs::FsOptions::new()).map_err(|err| {
            debug!("fat: mount rejected: {}", err);
            FsError::NoFileSystem
        })?;
        info!("fat: mounted {:?} volume, {:?}", fs.fat_type(), layout);
        fs.unmount().map_err(map_io)?;

        self.disk = Some(disk);
        self.layout = Some(layout);
        self.cwd = String::from("/");
        Ok(())
    }

    fn volume_info(&mut self, _root: &str) -> FsResult<VolumeInfo> {
        let layout = self.layout.ok_or(FsError::NotEnabled)?;
        with_fs!(self.disk, |fs| {
            let stats = fs.stats().map_err(map_io)?;
            let fat_type = match fs.fat_type() {
                fatfs::FatType::Fat12 => FatType::Fat12,
                fatfs::FatType::Fat16 => FatType::Fat16,
                fatfs::FatType::Fat32 => FatType::Fat32,
            };
            Ok(VolumeInfo {
                fat_type,
                sectors_per_cluster: layout.sectors_per_cluster,
                fat_count: layout.fat_count,
                root_entries: layout.root_entries,
                sectors_per_fat: layout.sectors_per_fat,
                cluster_count: stats.total_clusters(),
                free_clusters: stats.free_clusters(),
                volume_start: 0,
                fat_start: layout.fat_start,
                dir_start: layout.dir_start,
                data_start: layout.data_start,
            })
        })
    }

    fn volume_label(&mut self, _root: &str) -> FsResult<VolumeLabel> {
        with_fs!(self.disk, |fs| {
            Ok(VolumeLabel {
                label: bounded(fs.volume_label().trim_end()),
                serial: fs.volume_id(),
            })
        })
    }

    fn open_dir(&mut self, path: &str) -> FsResult<FatDir> {
        let path = self.absolute(path)?;
        let rel = relative(&path);
        let entries = with_fs!(self.disk, |fs| {
            let root = fs.root_dir();
            let listing = if rel.is_empty() {
                root
            } else {
                root.open_dir(rel).map_err(map_path)?
            };
            let entries: Vec<FsResult<FileInfo>> = listing
                .iter()
                .filter(|entry| entry.as_ref().map_or(true, |e| !is_dot(&e.file_name())))
                .map(|entry| {
                    entry.map_err(map_io).map(|e| {
                        let size = u32::try_from(e.len()).unwrap_or(u32::MAX);
                        let attributes = Attributes::from_bits_truncate(e.attributes().bits());
                        FileInfo::new(&e.file_name(), size, attributes)
                    })
                })
                .collect();
            Ok(entries)
        })?;
        debug!("fat: opened {} with {} entries", path, entries.len());
        Ok(FatDir { entries: entries.into_iter() })
    }

    fn read_dir(&mut self, dir: &mut FatDir) -> FsResult<Option<FileInfo>> {
        if self.disk.is_none() {
            return Err(FsError::NotEnabled);
        }
        dir.entries.next().transpose()
    }

    fn close_dir(&mut self, _dir: FatDir) -> FsResult<()> {
        self.disk.as_ref().map(|_| ()).ok_or(FsError::NotEnabled)
    }

    fn change_dir(&mut self, path: &str) -> FsResult<()> {
        let path = self.absolute(path)?;
        let rel = relative(&path);
        with_fs!(self.disk, |fs| {
            if !rel.is_empty() {
                fs.root_dir().open_dir(rel).map_err(map_path)?;
            }
            Ok(())
        })?;
        debug!("fat: cwd {}", path);
        self.cwd = path;
        Ok(())
    }

    fn current_dir(&mut self) -> FsResult<PathBuf> {
        if self.disk.is_none() {
            return Err(FsError::NotEnabled);
        }
        Ok(bounded(&self.cwd))
    }

    fn make_dir(&mut self, path: &str) -> FsResult<()> {
        let path = self.absolute(path)?;
        let rel = relative(&path);
        if rel.is_empty() {
            return Err(FsError::Exist);
        }
        with_fs!(self.disk, |fs| {
            let root = fs.root_dir();
            if root.open_dir(rel).is_ok() || root.open_file(rel).is_ok() {
                return Err(FsError::Exist);
            }
            root.create_dir(rel).map_err(map_path)?;
            Ok(())
        })
    }

    fn unlink(&mut self, path: &str) -> FsResult<()> {
        let path = self.absolute(path)?;
        let rel = relative(&path);
        let cwd_inside = self.cwd == path || self.cwd.starts_with(&format!("{}/", path));
        if rel.is_empty() || cwd_inside {
            return Err(FsError::Denied);
        }
        with_fs!(self.disk, |fs| {
            let root = fs.root_dir();
            if let Ok(dir) = root.open_dir(rel) {
                let occupied = dir
                    .iter()
                    .any(|entry| entry.map_or(true, |e| !is_dot(&e.file_name())));
                if occupied {
                    return Err(FsError::Denied);
                }
            }
            root.remove(rel).map_err(map_io)?;
            Ok(())
        })
    }

    fn open_file(&mut self, path: &str, mode: OpenMode) -> FsResult<FatFile> {
        let path = self.absolute(path)?;
        let rel = relative(&path);
        if rel.is_empty() {
            return Err(FsError::InvalidName);
        }
        let creates = OpenMode::CREATE_NEW | OpenMode::CREATE_ALWAYS | OpenMode::OPEN_ALWAYS;
        with_fs!(self.disk, |fs| {
            let root = fs.root_dir();
            if root.open_dir(rel).is_ok() {
                return Err(FsError::Denied);
            }
            let exists = root.open_file(rel).is_ok();
            if exists && mode.contains(OpenMode::CREATE_NEW) {
                return Err(FsError::Exist);
            }
            if !exists && !mode.intersects(creates) {
                return Err(FsError::NoFile);
            }
            if !exists || mode.contains(OpenMode::CREATE_ALWAYS) {
                let mut file = root.create_file(rel).map_err(map_path)?;
                if mode.contains(OpenMode::CREATE_ALWAYS) {
                    file.truncate().map_err(map_io)?;
                }
            }
            Ok(())
        })?;
        Ok(FatFile { path, pos: 0, mode })
    }

    fn read_file(&mut self, file: &mut FatFile, buf: &mut [u8]) -> FsResult<usize> {
        if !file.mode.contains(OpenMode::READ) {
            return Err(FsError::Denied);
        }
        let rel = relative(&file.path);
        let pos = file.pos;
        let count = with_fs!(self.disk, |fs| {
            let mut f = fs.root_dir().open_file(rel).map_err(map_io)?;
            f.seek(SeekFrom::Start(pos)).map_err(map_io)?;
            let mut n = 0;
            while n < buf.len() {
                match f.read(&mut buf[n..]) {
                    Ok(0) => break,
                    Ok(k) => n += k,
                    Err(err) => return Err(map_io(err)),
                }
            }
            Ok(n)
        })?;
        file.pos += count as u64;
        Ok(count)
    }

    fn write_file(&mut self, file: &mut FatFile, buf: &[u8]) -> FsResult<usize> {
        if !file.mode.contains(OpenMode::WRITE) {
            return Err(FsError::Denied);
        }
        let rel = relative(&file.path);
        let pos = file.pos;
        let count = with_fs!(self.disk, |fs| {
            let mut f = fs.root_dir().open_file(rel).map_err(map_io)?;
            f.seek(SeekFrom::Start(pos)).map_err(map_io)?;
            let mut n = 0;
            while n < buf.len() {
                match f.write(&buf[n..]) {
                    Ok(0) => break,
                    Ok(k) => n += k,
                    Err(err) if is_volume_full(&err) => {
                        warn!("fat: {} full after {} bytes", rel, pos + n as u64);
                        break;
                    }
                    Err(err) => return Err(map_io(err)),
                }
            }
            f.flush().map_err(map_io)?;
            Ok(n)
        })?;
        file.pos += count as u64;
        Ok(count)
    }

    fn close_file(&mut self, _file: FatFile) -> FsResult<()> {
        self.disk.as_ref().map(|_| ()).ok_or(FsError::NotEnabled)
    }
}
