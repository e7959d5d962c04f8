//! Device abstraction layer
//!
//! The consoles only ever see storage through [`BlockDevice`]. Card drivers
//! on the target and image files on the host implement it; [`RamDisk`] backs
//! the tests.

pub mod block;
pub mod ram;

pub use block::{sectors_in, BlockDevice, BlockError, TransferSpeed};
pub use ram::RamDisk;
