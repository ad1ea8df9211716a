//! Log manager
//!
//! Named, append-only log files with one lock per log. Every record is an
//! event line (timestamp, severity symbol, process identity) followed by the
//! word-wrapped message, a newline and [`ENTRY_DELIMITER`].

pub mod config;
pub mod format;
pub mod manager;
pub mod severity;

use std::path::PathBuf;

use crate::io::StreamError;

pub use config::{EnvLogDir, FixedLogDir, LogConfig, LogDirSource, LOG_DIR_ENV, LOG_SEVERITY_ENV};
pub use format::{Identity, ENTRY_DELIMITER, LINE_MAX_CHARS};
pub use manager::{LogManager, LogStatus};
pub use severity::{ParseSeverityError, Severity};

/// Errors from log manager operations
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("log directory unavailable: {0}")]
    DirUnavailable(String),

    #[error("log directory {} is not readable and writable: {source}", .path.display())]
    DirInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid log name: {0:?}")]
    InvalidName(String),

    #[error("log not registered: {0}")]
    NotFound(String),

    #[error("log not open: {0}")]
    NotOpen(String),

    #[error("log {name}: {source}")]
    Stream {
        name: String,
        #[source]
        source: StreamError,
    },
}

impl LogError {
    pub(crate) fn stream(name: &str, source: StreamError) -> Self {
        Self::Stream {
            name: name.to_string(),
            source,
        }
    }
}
