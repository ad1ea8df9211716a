//! File-backed byte stream

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::types::{ByteStream, OpenMode, StreamError};

/// Buffered file stream
///
/// Writes are buffered until [`ByteStream::flush`]; reads and rewinds flush
/// first so they observe everything written through this stream.
pub struct FileStream {
    inner: BufWriter<File>,
}

impl FileStream {
    /// Open `path` with the given mode, creating the file if needed
    ///
    /// # Errors
    /// Returns the underlying I/O error if the file cannot be opened.
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self, StreamError> {
        let mut options = OpenOptions::new();
        options.read(true).create(true);
        match mode {
            OpenMode::Append => options.append(true),
            OpenMode::Write => options.write(true).truncate(true),
        };
        let file = options.open(path)?;
        Ok(Self {
            inner: BufWriter::new(file),
        })
    }

    /// Flush and give back the file
    ///
    /// # Errors
    /// Returns the I/O error raised while flushing.
    pub fn into_file(self) -> Result<File, StreamError> {
        self.inner
            .into_inner()
            .map_err(|e| StreamError::Io(e.into_error()))
    }
}

impl ByteStream for FileStream {
    fn getc(&mut self) -> Result<Option<u8>, StreamError> {
        self.inner.flush()?;
        let mut byte = [0u8; 1];
        let n = self.inner.get_mut().read(&mut byte)?;
        Ok((n == 1).then_some(byte[0]))
    }

    fn putc(&mut self, byte: u8) -> Result<(), StreamError> {
        self.inner.write_all(&[byte])?;
        Ok(())
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), StreamError> {
        self.inner.write_all(data)?;
        Ok(())
    }

    fn rewind(&mut self) -> Result<(), StreamError> {
        self.inner.flush()?;
        self.inner.get_mut().seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        self.inner.flush()?;
        Ok(())
    }

    fn capacity(&self) -> Option<usize> {
        None
    }
}
