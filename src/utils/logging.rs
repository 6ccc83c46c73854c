/// Per-run logging context
///
/// Console output goes to stdout (or stderr, when stdout carries a report)
/// at the requested verbosity, with colors.
/// An optional log file receives everything at debug level, without colors.
/// The subscriber is installed as the thread's default only while the
/// context is alive.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, prelude::*, Registry};

/// Map the numeric `--log-level` to a console filter.
/// 1 and 2 both map to error: there is no separate critical level.
pub fn console_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        1 | 2 => LevelFilter::ERROR,
        3 => LevelFilter::WARN,
        5 => LevelFilter::DEBUG,
        _ => LevelFilter::INFO,
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub verbosity: u8,
    pub log_file: Option<PathBuf>,
    pub color: bool,
    pub to_stderr: bool,
}

pub struct LogContext {
    console_level: LevelFilter,
    log_file: Option<PathBuf>,
    _guard: DefaultGuard,
}

impl LogContext {
    pub fn init(settings: &LogSettings) -> Result<Self> {
        let console_level = console_level(settings.verbosity);

        let writer = if settings.to_stderr {
            BoxMakeWriter::new(std::io::stderr)
        } else {
            BoxMakeWriter::new(std::io::stdout)
        };

        let console = fmt::layer()
            .with_writer(writer)
            .with_ansi(settings.color)
            .with_target(false)
            .with_thread_names(true)
            .with_filter(console_level);

        let file_layer = match &settings.log_file {
            Some(path) => Some(
                fmt::layer()
                    .with_writer(Mutex::new(open_log_file(path)?))
                    .with_ansi(false)
                    .with_thread_names(true)
                    .with_filter(LevelFilter::DEBUG),
            ),
            None => None,
        };

        let subscriber = Registry::default().with(console).with(file_layer);
        let guard = tracing::subscriber::set_default(subscriber);

        Ok(Self {
            console_level,
            log_file: settings.log_file.clone(),
            _guard: guard,
        })
    }

    pub fn console_level(&self) -> LevelFilter {
        self.console_level
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to set up log file: {}", path.display()))
}
