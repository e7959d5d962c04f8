//! sdsh - SD card test console on the host
//!
//! Runs the block or filesystem console over stdin/stdout, with a raw disk
//! image standing in for the card.

mod disk;
mod fat;
mod logger;
mod term;

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use sdcon::{BlockConsole, FsConsole, Terminal};

use crate::disk::ImageDisk;
use crate::fat::FatVolume;
use crate::term::StdTerminal;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Raw sector exerciser
    Block,
    /// FAT filesystem console
    Fs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Level {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Off => LevelFilter::Off,
            Level::Error => LevelFilter::Error,
            Level::Warn => LevelFilter::Warn,
            Level::Info => LevelFilter::Info,
            Level::Debug => LevelFilter::Debug,
            Level::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser)]
#[command(name = "sdsh", about = "SD card test console over a disk image")]
struct Args {
    /// Disk image acting as the card
    #[arg(short, long)]
    image: PathBuf,

    /// Console to run
    #[arg(short, long, value_enum, default_value_t = Mode::Fs)]
    mode: Mode,

    /// Create a zero-filled image of this many MiB first
    #[arg(short, long)]
    create: Option<u64>,

    /// Lay a fresh FAT volume on the image first
    #[arg(short, long)]
    format: bool,

    /// Diagnostics written to stderr
    #[arg(short, long, value_enum, default_value_t = Level::Warn)]
    log_level: Level,
}

fn open_image(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    logger::init(args.log_level.into());

    if let Some(mib) = args.create {
        info!("creating {:?} ({} MiB)", args.image, mib);
        let file = File::create(&args.image)?;
        file.set_len(mib * 1024 * 1024)?;
    }
    if args.format {
        info!("formatting {:?}", args.image);
        let mut file = open_image(&args.image)?;
        fatfs::format_volume(&mut file, fatfs::FormatVolumeOptions::new())?;
    }

    let disk = ImageDisk::new(open_image(&args.image)?)?;
    let term = Terminal::new(StdTerminal::new());
    match args.mode {
        Mode::Block => BlockConsole::new(disk, term).run(),
        Mode::Fs => {
            let path = args.image.clone();
            let volume = FatVolume::new(move || open_image(&path));
            FsConsole::new(volume, disk, term).run();
        }
    }
    Ok(())
}
