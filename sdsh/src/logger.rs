//! Stderr logger for the host console
//!
//! Diagnostics go to stderr so they never mix with the console session on
//! stdout.

use log::{Level, LevelFilter, Log, Metadata, Record};

static LOGGER: StderrLogger = StderrLogger;
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let color = match record.level() {
                Level::Error => "31",
                Level::Warn => "33",
                Level::Info => "32",
                Level::Debug => "36",
                Level::Trace => "90",
            };
            eprintln!(
                "\x1b[{}m[{:>5}] {}: {}\x1b[0m",
                color,
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

/// Initialize the logger (call once at startup)
pub fn init(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
