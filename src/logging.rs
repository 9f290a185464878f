//! Logging setup
//!
//! env_logger writing every line to stderr and to the configured log file.
//! `RUST_LOG` still overrides the configured level.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use log::LevelFilter;

/// Map a configured level name to a filter.
///
/// Accepts the Python-style names older config files use
/// (WARNING, CRITICAL) alongside the Rust ones, in any case.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Some(LevelFilter::Trace),
        "DEBUG" => Some(LevelFilter::Debug),
        "INFO" => Some(LevelFilter::Info),
        "WARN" | "WARNING" => Some(LevelFilter::Warn),
        "ERROR" | "CRITICAL" => Some(LevelFilter::Error),
        "OFF" => Some(LevelFilter::Off),
        _ => None,
    }
}

/// Duplicates every write to stderr and the log file
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Initialize the global logger. Fails if the log file can't be opened.
pub fn init_logging(level: &str, log_file: impl AsRef<Path>) -> io::Result<()> {
    let level = parse_level(level).unwrap_or(LevelFilter::Info);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file.as_ref())?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.to_string().to_lowercase()),
    )
    .format(|buf, record| {
        writeln!(
            buf,
            "{} - {} - {} - {}",
            buf.timestamp_millis(),
            record.target(),
            record.level(),
            record.args()
        )
    })
    .target(env_logger::Target::Pipe(Box::new(TeeWriter { file })))
    .try_init()
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}
