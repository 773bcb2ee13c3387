//! Structured logging to stderr (or a file).
//!
//! The widget engine shares stderr with the service command it invokes, so
//! logs default to quiet (warn) and can be redirected to a file via
//! `QUOTABAR_LOG_FILE` when the host desktop captures nothing.

use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const LOG_LEVEL_ENV: &str = "QUOTABAR_LOG";
const LOG_FORMAT_ENV: &str = "QUOTABAR_LOG_FORMAT";
const LOG_FILE_ENV: &str = "QUOTABAR_LOG_FILE";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable logs.
    #[default]
    Human,
    /// JSON logs (one event per line).
    Json,
    /// Compact single-line logs.
    Compact,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Resolve the filter directive: `QUOTABAR_LOG` (or `RUST_LOG`) wins, then
/// the `--verbose` flag, then warn.
fn filter(verbose: bool) -> EnvFilter {
    if let Ok(value) = std::env::var(LOG_LEVEL_ENV) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return EnvFilter::new(format!("quotabar={trimmed}"));
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "warn" };
        EnvFilter::new(format!("quotabar={level}"))
    })
}

/// Log format from `QUOTABAR_LOG_FORMAT`.
#[must_use]
pub fn format_from_env() -> LogFormat {
    std::env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|value| LogFormat::from_arg(value.trim()))
        .unwrap_or_default()
}

/// Optional log file path from `QUOTABAR_LOG_FILE`.
#[must_use]
pub fn log_file_from_env() -> Option<PathBuf> {
    std::env::var(LOG_FILE_ENV).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    })
}

/// Initialize the global subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init(verbose: bool) {
    let format = format_from_env();
    let file = log_file_from_env().and_then(|path| {
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    let writer = file.map_or_else(
        || BoxMakeWriter::new(std::io::stderr),
        BoxMakeWriter::new,
    );

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter(verbose))
                .json()
                .with_writer(writer)
                .try_init()
                .ok();
        }
        LogFormat::Compact => {
            tracing_subscriber::fmt()
                .with_env_filter(filter(verbose))
                .compact()
                .with_writer(writer)
                .with_target(true)
                .try_init()
                .ok();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(filter(verbose))
                .with_writer(writer)
                .with_target(false)
                .without_time()
                .try_init()
                .ok();
        }
    }
}
