//! Mount and volume report

use embedded_io::Write;

use crate::config::{SECTOR_SIZE, SECTORS_PER_KIB};
use crate::device::BlockDevice;
use crate::fs::{FileSystem, FsError, FsResult, VolumeInfo};
use crate::terminal::Terminal;

/// Root every mount happens at
pub const ROOT: &str = "/";

/// Bring up the card, mount its volume and print geometry and label.
///
/// Returns the mount result only: a failing free-space or label query is
/// reported on the terminal but leaves the volume mounted.
pub fn mount<F, D, T>(fs: &mut F, dev: &mut D, term: &mut Terminal<T>) -> FsResult<()>
where
    F: FileSystem,
    D: BlockDevice,
    T: Write,
{
    if let Err(err) = dev.init().map_err(FsError::from) {
        cprintln!(term, "ERROR: mount={}", err);
        return Err(err);
    }
    if let Err(err) = fs.mount(ROOT) {
        cprintln!(term, "ERROR: mount={}", err);
        return Err(err);
    }

    match fs.volume_info(ROOT) {
        Ok(info) => report(term, &info),
        Err(err) => cprintln!(term, "ERROR: getfree={}", err),
    }

    match fs.volume_label(ROOT) {
        Ok(label) => {
            cprintln!(term, "Label = {}", label.label);
            cprintln!(term, "Serial No = {:08x}", label.serial);
        }
        Err(err) => cprintln!(term, "ERROR: getlabel={}", err),
    }
    Ok(())
}

fn report<T: Write>(term: &mut Terminal<T>, info: &VolumeInfo) {
    let cluster = u64::from(info.sectors_per_cluster);
    let total_kib = u64::from(info.cluster_count) * cluster / SECTORS_PER_KIB;
    let free_kib = u64::from(info.free_clusters) * cluster / SECTORS_PER_KIB;

    cprintln!(term, "FAT type = {}", info.fat_type.as_str());
    cprintln!(term, "Bytes/Cluster = {}", cluster * SECTOR_SIZE as u64);
    cprintln!(term, "Number of FATs = {}", info.fat_count);
    cprintln!(term, "Root DIR entries = {}", info.root_entries);
    cprintln!(term, "Sectors/FAT = {}", info.sectors_per_fat);
    cprintln!(term, "Number of clusters = {}", info.cluster_count);
    cprintln!(term, "Volume start (lba) = {}", info.volume_start);
    cprintln!(term, "FAT start (lba) = {}", info.fat_start);
    cprintln!(term, "DIR start (lba,cluster) = {}", info.dir_start);
    cprintln!(term, "Data start (lba) = {}", info.data_start);
    cprintln!(term, "Disk space = {} KB", total_kib);
    cprintln!(term, "Available  = {} KB", free_kib);
}
