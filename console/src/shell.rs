//! Console shells
//!
//! Two interactive variants share the same loop: print a prompt, read one
//! line, dispatch it, repeat.
//!
//! - [`BlockConsole`] drives a [`BlockDevice`] sector by sector with
//!   one-letter verbs.
//! - [`FsConsole`] drives a [`FileSystem`] mounted on the device with
//!   two-letter verbs (`c` card, `d` directory, `f` file).
//!
//! Blank lines and unknown verbs are ignored without any output.

use embedded_io::{Read, Write};
use log::{trace, warn};

use crate::commands::{self, card, dir, mount, stream};
use crate::config::{BLOCK_LINE_CAPACITY, FS_LINE_CAPACITY, SECTOR_SIZE, STREAM_CHUNK};
use crate::device::{BlockDevice, TransferSpeed};
use crate::fs::{FileSystem, PathBuf};
use crate::line::read_line;
use crate::terminal::Terminal;

// ═══════════════════════════════════════════════════════════════════════════════
// VERBS
// ═══════════════════════════════════════════════════════════════════════════════

/// Block console verbs, selected by the first byte of the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardVerb {
    /// `i` - initialise the card
    Init,
    /// `s` - report capacity
    Size,
    /// `r` - read and dump the sector at the address
    Read,
    /// `w` - write the test pattern at the address
    Write,
    /// `e` - erase the sector at the address
    Erase,
    /// `c` - slow transfers
    Slow,
    /// `C` - fast transfers
    Fast,
    /// `a<N>` - set the address register
    Address(u32),
}

impl CardVerb {
    pub fn parse(line: &[u8]) -> Option<Self> {
        let (&first, rest) = line.split_first()?;
        Some(match first {
            b'i' => CardVerb::Init,
            b's' => CardVerb::Size,
            b'r' => CardVerb::Read,
            b'w' => CardVerb::Write,
            b'e' => CardVerb::Erase,
            b'c' => CardVerb::Slow,
            b'C' => CardVerb::Fast,
            b'a' => CardVerb::Address(parse_decimal(rest)),
            _ => return None,
        })
    }
}

/// Parse an unsigned decimal number the way `strtoul` does: leading blanks
/// and one `+` are skipped, parsing stops at the first non-digit, no digits
/// gives 0 and overflow saturates.
pub fn parse_decimal(text: &[u8]) -> u32 {
    let mut digits = text.iter().skip_while(|b| b.is_ascii_whitespace()).peekable();
    if digits.peek() == Some(&&b'+') {
        digits.next();
    }
    let mut value: u32 = 0;
    for &b in digits.take_while(|b| b.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    value
}

/// Filesystem console verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsVerb {
    /// `cm`
    Mount,
    /// `cs`
    Size,
    /// `dt`
    Tree,
    /// `dl`
    List,
    /// `dc`
    ChangeDir,
    /// `dm`
    MakeDir,
    /// `dr`
    RemoveDir,
    /// `fw`
    Write,
    /// `fr`
    Read,
    /// `fd`
    Delete,
}

impl FsVerb {
    fn from_bytes(group: u8, action: u8) -> Option<Self> {
        Some(match (group, action) {
            (b'c', b'm') => FsVerb::Mount,
            (b'c', b's') => FsVerb::Size,
            (b'd', b't') => FsVerb::Tree,
            (b'd', b'l') => FsVerb::List,
            (b'd', b'c') => FsVerb::ChangeDir,
            (b'd', b'm') => FsVerb::MakeDir,
            (b'd', b'r') => FsVerb::RemoveDir,
            (b'f', b'w') => FsVerb::Write,
            (b'f', b'r') => FsVerb::Read,
            (b'f', b'd') => FsVerb::Delete,
            _ => return None,
        })
    }

    /// Directory verbs fall back to `.` when no argument is given
    fn defaults_to_current_dir(self) -> bool {
        matches!(
            self,
            FsVerb::Tree | FsVerb::List | FsVerb::ChangeDir | FsVerb::MakeDir | FsVerb::RemoveDir
        )
    }
}

/// One parsed filesystem console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    pub verb: FsVerb,
    /// Rest of the line after the verb, leading spaces removed
    pub arg: &'a str,
}

impl<'a> Command<'a> {
    /// Parse a line; `None` for blank lines, unknown verbs and arguments
    /// that are not UTF-8
    pub fn parse(line: &'a [u8]) -> Option<Self> {
        let group = *line.first()?;
        let action = line.get(1).copied().unwrap_or(0);
        let verb = FsVerb::from_bytes(group, action)?;

        let rest = line.get(2..).unwrap_or(&[]);
        let start = rest.iter().position(|&b| b != b' ').unwrap_or(rest.len());
        let arg = core::str::from_utf8(&rest[start..]).ok()?;
        let arg = if arg.is_empty() && verb.defaults_to_current_dir() {
            "."
        } else {
            arg
        };
        Some(Command { verb, arg })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCK CONSOLE
// ═══════════════════════════════════════════════════════════════════════════════

const BLOCK_PROMPT: &str = "> ";

/// Raw sector console
pub struct BlockConsole<D, T> {
    dev: D,
    term: Terminal<T>,
    /// Address register; 0 means unset
    address: u32,
    speed: TransferSpeed,
    sector: [u8; SECTOR_SIZE],
}

impl<D: BlockDevice, T: Read + Write> BlockConsole<D, T> {
    pub fn new(dev: D, term: Terminal<T>) -> Self {
        Self {
            dev,
            term,
            address: 0,
            speed: TransferSpeed::default(),
            sector: [0u8; SECTOR_SIZE],
        }
    }

    /// Serve commands until the transport closes
    pub fn run(&mut self) {
        loop {
            self.term.put_bytes(BLOCK_PROMPT.as_bytes());
            self.term.flush();
            let mut line = [0u8; BLOCK_LINE_CAPACITY];
            match read_line(&mut self.term, &mut line) {
                Ok(0) => continue,
                Ok(len) => self.execute(&line[..len]),
                Err(_) => return,
            }
        }
    }

    /// Dispatch one line
    pub fn execute(&mut self, line: &[u8]) {
        let Some(verb) = CardVerb::parse(line) else {
            trace!("block console: ignored {:?}", line);
            return;
        };
        trace!("block console: {:?}", verb);

        let dev = &mut self.dev;
        let term = &mut self.term;
        // failures are already on the terminal
        let _ = match verb {
            CardVerb::Init => card::init(dev, term),
            CardVerb::Size => card::show_size(dev, term)
                .map(|_| ())
                .inspect_err(|err| cprintln!(term, "!size error: {}", err)),
            CardVerb::Read => card::read_sector(dev, term, self.address, &mut self.sector),
            CardVerb::Write => card::write_pattern(dev, term, self.address, &mut self.sector),
            CardVerb::Erase => card::erase_sector(dev, term, self.address),
            CardVerb::Slow | CardVerb::Fast => {
                let speed = if verb == CardVerb::Slow {
                    TransferSpeed::Slow
                } else {
                    TransferSpeed::Fast
                };
                dev.set_speed(speed);
                self.speed = speed;
                Ok(())
            }
            CardVerb::Address(address) => {
                self.address = address;
                Ok(())
            }
        };
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn speed(&self) -> TransferSpeed {
        self.speed
    }

    pub fn device(&self) -> &D {
        &self.dev
    }

    pub fn terminal(&self) -> &Terminal<T> {
        &self.term
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<T> {
        &mut self.term
    }

    pub fn into_parts(self) -> (D, Terminal<T>) {
        (self.dev, self.term)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILESYSTEM CONSOLE
// ═══════════════════════════════════════════════════════════════════════════════

/// FAT filesystem console
///
/// The device is only used directly for the capacity query; everything else
/// goes through the filesystem mounted on it.
pub struct FsConsole<F, D, T> {
    fs: F,
    dev: D,
    term: Terminal<T>,
    /// Working directory shown in the prompt; empty until mounted
    cwd: PathBuf,
    scratch: [u8; SECTOR_SIZE],
}

impl<F: FileSystem, D: BlockDevice, T: Read + Write> FsConsole<F, D, T> {
    pub fn new(fs: F, dev: D, term: Terminal<T>) -> Self {
        Self {
            fs,
            dev,
            term,
            cwd: PathBuf::new(),
            scratch: [0u8; SECTOR_SIZE],
        }
    }

    /// Serve commands until the transport closes
    pub fn run(&mut self) {
        loop {
            cprint!(self.term, "{}> ", self.cwd);
            self.term.flush();
            let mut line = [0u8; FS_LINE_CAPACITY];
            match read_line(&mut self.term, &mut line) {
                Ok(0) => continue,
                Ok(len) => self.execute(&line[..len]),
                Err(_) => return,
            }
        }
    }

    /// Dispatch one line
    pub fn execute(&mut self, line: &[u8]) {
        let Some(Command { verb, arg }) = Command::parse(line) else {
            trace!("fs console: ignored {:?}", line);
            return;
        };
        trace!("fs console: {:?} {:?}", verb, arg);

        let fs = &mut self.fs;
        let term = &mut self.term;
        let chunk = &mut self.scratch[..STREAM_CHUNK];
        match verb {
            FsVerb::Mount => {
                if mount::mount(fs, &mut self.dev, term).is_ok() {
                    self.cwd.clear();
                    let _ = self.cwd.push_str(mount::ROOT);
                }
            }
            FsVerb::Size => {
                if let Err(err) = card::show_size(&mut self.dev, term) {
                    cprintln!(term, "ERROR: ioctl(GET_SECTOR_COUNT)={}", err);
                }
            }
            FsVerb::Tree => {
                let _ = commands::tree(fs, term, arg);
            }
            FsVerb::List => {
                let _ = dir::list(fs, term, arg);
            }
            FsVerb::ChangeDir => {
                if dir::change(fs, term, arg).is_ok() {
                    match fs.current_dir() {
                        Ok(cwd) => self.cwd = cwd,
                        Err(err) => warn!("fs console: cwd query failed: {}", err),
                    }
                }
            }
            FsVerb::MakeDir => {
                let _ = dir::make(fs, term, arg);
            }
            FsVerb::RemoveDir | FsVerb::Delete => {
                let _ = dir::remove(fs, term, arg);
            }
            FsVerb::Write => {
                let _ = stream::upload(fs, term, arg, chunk);
            }
            FsVerb::Read => {
                let _ = stream::download(fs, term, arg, chunk);
            }
        }
    }

    /// Working directory as last reported by the filesystem
    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    pub fn filesystem_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    pub fn terminal(&self) -> &Terminal<T> {
        &self.term
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<T> {
        &mut self.term
    }

    pub fn into_parts(self) -> (F, D, Terminal<T>) {
        (self.fs, self.dev, self.term)
    }
}
