//! Fixed-capacity in-memory byte stream
//!
//! Backed by a zeroed `Vec<u8>` of the requested capacity. Reads stop at the
//! furthest byte ever written; writes past the capacity fail.

use super::types::{ByteStream, StreamError};

pub struct MemStream {
    data: Vec<u8>,
    end: usize,
    pos: usize,
    eof: bool,
}

impl MemStream {
    /// Create a stream that holds up to `capacity` bytes
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            end: 0,
            pos: 0,
            eof: false,
        }
    }

    /// Bytes written so far, from the start of the stream
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.data[..self.end]
    }

    /// Current read/write position
    #[must_use]
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Whether the last read hit the end of the stream
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.eof
    }
}

impl ByteStream for MemStream {
    fn getc(&mut self) -> Result<Option<u8>, StreamError> {
        if self.pos >= self.end {
            self.eof = true;
            return Ok(None);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }

    fn putc(&mut self, byte: u8) -> Result<(), StreamError> {
        if self.pos >= self.data.len() {
            return Err(StreamError::Full);
        }
        self.data[self.pos] = byte;
        self.pos += 1;
        self.end = self.end.max(self.pos);
        Ok(())
    }

    fn rewind(&mut self) -> Result<(), StreamError> {
        self.pos = 0;
        self.eof = false;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        Ok(())
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.data.len())
    }
}

impl std::fmt::Debug for MemStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemStream")
            .field("capacity", &self.data.len())
            .field("end", &self.end)
            .field("pos", &self.pos)
            .field("eof", &self.eof)
            .finish()
    }
}
