//! SD card test console
//!
//! Line-oriented diagnostic consoles for exercising a block storage device,
//! either as raw sectors or through a FAT filesystem mounted on it.
//!
//! ## Layout
//!
//! - [`device`] - block device collaborator trait and an in-memory disk
//! - [`fs`] - filesystem collaborator trait, result codes, path handling
//! - [`commands`] - the operations behind each console verb
//! - [`shell`] - verb parsing and the two console variants
//!
//! The crate owns no hardware. Drivers and filesystem engines plug in through
//! [`device::BlockDevice`] and [`fs::FileSystem`]; the operator talks to the
//! console over any `embedded_io` byte transport.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod terminal;

pub mod commands;
pub mod config;
pub mod device;
pub mod dump;
pub mod fs;
pub mod line;
pub mod shell;

#[cfg(test)]
mod testing;

pub use shell::{BlockConsole, FsConsole};
pub use terminal::Terminal;
