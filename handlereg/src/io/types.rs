//! Byte-stream primitive shared by the buffer registry and the log manager

use std::fmt;
use std::str::FromStr;

/// Errors raised by byte streams
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The stream has no room for another byte
    #[error("stream is full")]
    Full,

    /// Unrecognized open mode string
    #[error("invalid open mode: {0:?}")]
    InvalidMode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mode for opening a file-backed stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Create if missing, every write goes to the end (`"a"`)
    #[default]
    Append,
    /// Create if missing, truncate existing content (`"w"`)
    Write,
}

impl OpenMode {
    /// fopen-style spelling of the mode
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Append => "a",
            Self::Write => "w",
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpenMode {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "a+" | "ab" | "append" => Ok(Self::Append),
            "w" | "w+" | "wb" | "write" => Ok(Self::Write),
            other => Err(StreamError::InvalidMode(other.to_string())),
        }
    }
}

/// Single-byte stream with a rewindable position
///
/// Implementations are not synchronized; the registries serialize access with
/// a per-entry lock.
pub trait ByteStream {
    /// Read one byte. `Ok(None)` means end of stream.
    fn getc(&mut self) -> Result<Option<u8>, StreamError>;

    /// Write one byte at the current position.
    fn putc(&mut self, byte: u8) -> Result<(), StreamError>;

    /// Write every byte of `data` or fail.
    fn write_all(&mut self, data: &[u8]) -> Result<(), StreamError> {
        for &byte in data {
            self.putc(byte)?;
        }
        Ok(())
    }

    /// Move to the start of the stream and clear the end-of-stream flag.
    fn rewind(&mut self) -> Result<(), StreamError>;

    /// Push buffered bytes to the backing store.
    fn flush(&mut self) -> Result<(), StreamError>;

    /// Fixed capacity in bytes, `None` for unbounded streams.
    fn capacity(&self) -> Option<usize>;
}
