//! Stderr logger for the command-line binary.
//!
//! The library only ever logs through the `log` facade; installing a logger
//! is left to the binary.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

/// Writes log records to standard error, one line per record.
#[derive(Debug, Clone, Copy)]
pub struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    /// Creates a logger that emits records up to `level`.
    #[must_use]
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// Maps the CLI verbosity flags to a level filter.
    ///
    /// `quiet` wins over any number of `-v` flags.
    #[must_use]
    pub const fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::Error;
        }
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn format(&self, record: &Record<'_>) -> String {
        if self.level >= LevelFilter::Debug {
            format!("[{}] {}: {}", record.level(), record.target(), record.args())
        } else {
            format!("[{}] {}", record.level(), record.args())
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.format(record);
        // Nowhere left to report a failed write to stderr.
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Installs a [`StderrLogger`] as the global logger.
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger was already installed.
pub fn init(verbose: u8, quiet: bool) -> Result<(), SetLoggerError> {
    let level = StderrLogger::level_for(verbose, quiet);
    log::set_boxed_logger(Box::new(StderrLogger::new(level)))?;
    log::set_max_level(level);
    Ok(())
}
