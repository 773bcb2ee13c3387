//! Error types for quotabar.
//!
//! Uses `thiserror` for structured error types. The refresh-channel errors
//! (`NoOutput`, `MalformedOutput`, `TimedOut`, `Spawn`) are never fatal:
//! they are absorbed into the session's `last_error` string and cleared by
//! the next successful refresh. Configuration errors are fatal and surface
//! at startup.

use thiserror::Error;

/// Main error type for quotabar operations.
#[derive(Error, Debug)]
pub enum QuotabarError {
    // ==========================================================================
    // Refresh channel errors (recovered into `last_error`)
    // ==========================================================================
    /// The service command produced empty stdout. Carries stderr text when
    /// the command wrote any; that text becomes the visible error verbatim.
    #[error("{}", no_output_message(stderr.as_deref()))]
    NoOutput { stderr: Option<String> },

    /// Non-empty stdout failed to parse as the snapshot schema.
    #[error("malformed output from service command: {message}")]
    MalformedOutput { message: String },

    /// The service command did not finish within the configured timeout.
    #[error("service command timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    /// The service command could not be started at all.
    #[error("failed to run service command: {reason}")]
    Spawn { reason: String },

    // ==========================================================================
    // Configuration errors
    // ==========================================================================
    /// Error parsing the configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid { key: String, message: String },

    // ==========================================================================
    // Passthrough
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn no_output_message(stderr: Option<&str>) -> String {
    match stderr {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => "no data from service command".to_string(),
    }
}

impl QuotabarError {
    /// Whether this error belongs to the refresh channel and should be
    /// absorbed into the session rather than propagated.
    #[must_use]
    pub const fn is_refresh_error(&self) -> bool {
        matches!(
            self,
            Self::NoOutput { .. }
                | Self::MalformedOutput { .. }
                | Self::TimedOut { .. }
                | Self::Spawn { .. }
        )
    }

    /// The string published as the session's `last_error`.
    #[must_use]
    pub fn session_message(&self) -> String {
        self.to_string()
    }
}

/// Result type alias for quotabar operations.
pub type Result<T> = std::result::Result<T, QuotabarError>;
