//! Console configuration constants

/// Bytes per device sector
pub const SECTOR_SIZE: usize = 512;

/// Input line capacity of the block console (including the terminator slot)
pub const BLOCK_LINE_CAPACITY: usize = 12;

/// Input line capacity of the filesystem console (including the terminator slot)
pub const FS_LINE_CAPACITY: usize = 32;

/// Maximum length of an absolute path
pub const PATH_CAPACITY: usize = 256;

/// Maximum length of a single directory entry name
pub const NAME_CAPACITY: usize = 255;

/// Maximum length of a volume label
pub const LABEL_CAPACITY: usize = 32;

/// Chunk size used by the file stream writer and reader
pub const STREAM_CHUNK: usize = 128;

/// Deepest directory level the tree walker descends to
pub const MAX_TREE_HEIGHT: usize = 16;

/// Input bytes at or below this value end a file upload
pub const END_OF_INPUT: u8 = 0x04;

/// Value an erased sector reads back as
pub const ERASED_BYTE: u8 = 0xFF;

/// Sectors per KiB, for size reports
pub const SECTORS_PER_KIB: u64 = 1024 / SECTOR_SIZE as u64;
