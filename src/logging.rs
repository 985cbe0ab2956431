//! Tracing subscriber setup.
//!
//! The dashboard owns the terminal, so in dashboard mode log lines go to a
//! file or nowhere. Subcommands log to stderr.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Log level options for CLI parsing and config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Discard,
}

impl LogTarget {
    /// Dashboard mode never writes to the terminal it draws on.
    pub fn for_dashboard(log_file: Option<PathBuf>) -> Self {
        log_file.map_or(LogTarget::Discard, LogTarget::File)
    }

    /// Subcommands print to stdout, so logs may share the terminal.
    pub fn for_command(log_file: Option<PathBuf>) -> Self {
        log_file.map_or(LogTarget::Stderr, LogTarget::File)
    }
}

/// Initializes tracing logging subsystem with configured log level
pub fn setup_logging(level: LogLevel, target: LogTarget) -> Result<()> {
    let filter = LevelFilter::from(level);

    match &target {
        LogTarget::Stderr => install(filter, io::stderr, true)?,
        LogTarget::Discard => install(filter, io::sink, false)?,
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            install(filter, Mutex::new(file), false)?;
        }
    }

    info!("Logging initialized with level: {:?}", level);
    Ok(())
}

fn install<W>(filter: LevelFilter, writer: W, ansi: bool) -> Result<()>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(ansi)
        .with_writer(writer)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(LevelFilter::from(LogLevel::Off), LevelFilter::OFF);
        assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::WARN);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
    }

    #[test]
    fn test_dashboard_never_logs_to_terminal() {
        assert_eq!(LogTarget::for_dashboard(None), LogTarget::Discard);
        assert_eq!(LogTarget::for_command(None), LogTarget::Stderr);
        assert_eq!(
            LogTarget::for_dashboard(Some(PathBuf::from("/tmp/p.log"))),
            LogTarget::File(PathBuf::from("/tmp/p.log"))
        );
    }

    #[test]
    fn test_log_level_parses_from_config_text() {
        let level: LogLevel = serde_yaml::from_str("debug").unwrap();
        assert_eq!(level, LogLevel::Debug);
    }
}
