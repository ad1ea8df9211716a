//! Registry of locked in-memory stream buffers
//!
//! Every buffer lives in its own slot of a [`HandleTable`] and carries its own
//! `parking_lot::Mutex`. At most one thread manipulates a buffer's stream at a
//! time; different buffers are independent.
//!
//! # Locking
//!
//! - The table sits behind a `RwLock`. Lookups take the read lock just long
//!   enough to clone the slot's `Arc`; create and destroy take the write lock.
//! - The entry lock is never held while the table write lock is requested.
//! - [`BufferRegistry::getc`], [`BufferRegistry::putc`] and
//!   [`BufferRegistry::rewind`] are each atomic on their own. Callers that need
//!   several operations in one critical section use [`BufferRegistry::lock`]
//!   and work through the returned [`BufferGuard`].
//!
//! # Example
//!
//! ```
//! use handlereg::sbuf::BufferRegistry;
//!
//! let registry = BufferRegistry::new();
//! let buf = registry.create(128).unwrap();
//! for &b in b"ABCDE" {
//!     registry.putc(b, &buf).unwrap();
//! }
//! registry.rewind(&buf).unwrap();
//! assert_eq!(registry.getc(&buf).unwrap(), Some(b'A'));
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex, RwLock};

use crate::handle::Handle;
use crate::io::{ByteStream, MemStream, StreamError};
use crate::table::HandleTable;

/// Default capacity for a new buffer, in bytes
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Default time `destroy` waits for a busy buffer lock
pub const DEFAULT_DESTROY_TIMEOUT: Duration = Duration::from_secs(1);

/// Stream owned by a buffer slot
pub type BoxedStream = Box<dyn ByteStream + Send>;

/// `None` once the buffer has been destroyed or detached
type BufferCell = Arc<Mutex<Option<BoxedStream>>>;

/// Errors from buffer registry operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("buffer size must be non-zero")]
    ZeroSize,

    /// The handle does not refer to a live buffer
    #[error("stale or unknown buffer handle {0}")]
    StaleHandle(Handle),

    /// The buffer lock stayed busy for the whole timeout
    #[error("buffer lock still busy after {0:?}")]
    LockTimeout(Duration),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl BufferError {
    /// Whether the error is a write to a full buffer
    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Stream(StreamError::Full))
    }
}

/// Caller's reference to a registered buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferHandle {
    id: Handle,
    size: usize,
}

impl BufferHandle {
    #[must_use]
    pub fn id(&self) -> Handle {
        self.id
    }

    /// Capacity requested at creation
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Exclusive access to one buffer
///
/// Holds the buffer's lock until dropped or passed to
/// [`BufferRegistry::unlock`].
pub struct BufferGuard {
    id: Handle,
    guard: ArcMutexGuard<RawMutex, Option<BoxedStream>>,
}

impl BufferGuard {
    /// Slot the guard holds
    #[must_use]
    pub fn id(&self) -> Handle {
        self.id
    }

    fn stream(&mut self) -> Result<&mut BoxedStream, BufferError> {
        (*self.guard).as_mut().ok_or(BufferError::StaleHandle(self.id))
    }

    /// Read one byte, `None` at end of stream
    ///
    /// # Errors
    /// Propagates stream failures.
    pub fn getc(&mut self) -> Result<Option<u8>, BufferError> {
        Ok(self.stream()?.getc()?)
    }

    /// Write one byte and return it
    ///
    /// # Errors
    /// Fails when the buffer is full.
    pub fn putc(&mut self, byte: u8) -> Result<u8, BufferError> {
        self.stream()?.putc(byte)?;
        Ok(byte)
    }

    /// Reposition to the start and clear the end-of-stream flag
    ///
    /// # Errors
    /// Propagates stream failures.
    pub fn rewind(&mut self) -> Result<(), BufferError> {
        Ok(self.stream()?.rewind()?)
    }

    /// Capacity of the backing stream
    ///
    /// # Errors
    /// Fails only if the slot was emptied underneath the guard.
    pub fn capacity(&mut self) -> Result<Option<usize>, BufferError> {
        Ok(self.stream()?.capacity())
    }
}

/// Registry of in-memory stream buffers
pub struct BufferRegistry {
    table: RwLock<HandleTable<BufferCell>>,
}

impl BufferRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: RwLock::new(HandleTable::new()),
        }
    }

    /// Registry whose table starts with room for `page` buffers
    #[must_use]
    pub fn with_page(page: usize) -> Self {
        Self {
            table: RwLock::new(HandleTable::with_page(page)),
        }
    }

    /// Allocate a zeroed memory stream of `size` bytes and register it
    ///
    /// # Errors
    /// Returns `ZeroSize` for an empty request.
    pub fn create(&self, size: usize) -> Result<BufferHandle, BufferError> {
        if size == 0 {
            return Err(BufferError::ZeroSize);
        }
        Ok(self.insert(Box::new(MemStream::new(size)), size))
    }

    /// Register a caller-supplied stream
    ///
    /// The registry owns the stream until [`Self::destroy`] drops it or
    /// [`Self::detach`] hands it back. Unbounded streams report size 0.
    pub fn register(&self, stream: BoxedStream) -> BufferHandle {
        let size = stream.capacity().unwrap_or(0);
        self.insert(stream, size)
    }

    fn insert(&self, stream: BoxedStream, size: usize) -> BufferHandle {
        let mut table = self.table.write();
        let id = table.insert(Arc::new(Mutex::new(Some(stream))));
        log::debug!(
            "sbuf.create: {id} size {size} (used {}, allocated {})",
            table.used(),
            table.allocated()
        );
        BufferHandle { id, size }
    }

    fn cell(&self, handle: &BufferHandle) -> Result<BufferCell, BufferError> {
        self.table
            .read()
            .get(handle.id)
            .cloned()
            .ok_or(BufferError::StaleHandle(handle.id))
    }

    /// Acquire the buffer's lock, blocking while another thread holds it
    ///
    /// The slot is validated after the lock is taken, so a buffer destroyed
    /// while this call was waiting is reported as stale.
    ///
    /// # Errors
    /// Returns `StaleHandle` for destroyed or unknown buffers; the lock is
    /// already released in that case.
    pub fn lock(&self, handle: &BufferHandle) -> Result<BufferGuard, BufferError> {
        let cell = self.cell(handle)?;
        let guard = cell.lock_arc();
        if guard.is_none() {
            return Err(BufferError::StaleHandle(handle.id));
        }
        Ok(BufferGuard {
            id: handle.id,
            guard,
        })
    }

    /// Release a lock taken with [`Self::lock`]
    pub fn unlock(&self, guard: BufferGuard) {
        drop(guard);
    }

    /// Lock, read one byte, unlock. `Ok(None)` is end of stream.
    ///
    /// # Errors
    /// Returns `StaleHandle` for destroyed buffers.
    pub fn getc(&self, handle: &BufferHandle) -> Result<Option<u8>, BufferError> {
        let mut guard = self.lock(handle)?;
        let result = guard.getc();
        self.unlock(guard);
        result
    }

    /// Lock, write one byte, unlock. Returns the byte written.
    ///
    /// # Errors
    /// Fails when the buffer is full or the handle is stale.
    pub fn putc(&self, byte: u8, handle: &BufferHandle) -> Result<u8, BufferError> {
        let mut guard = self.lock(handle)?;
        let result = guard.putc(byte);
        self.unlock(guard);
        result
    }

    /// Lock, reposition to start and clear the end flag, unlock
    ///
    /// # Errors
    /// Returns `StaleHandle` for destroyed buffers.
    pub fn rewind(&self, handle: &BufferHandle) -> Result<(), BufferError> {
        let mut guard = self.lock(handle)?;
        let result = guard.rewind();
        self.unlock(guard);
        result
    }

    /// Destroy the buffer, waiting up to `timeout` for its lock
    ///
    /// Only brief contention is tolerated: destroying a buffer that another
    /// thread keeps locked is a usage error and ends in `LockTimeout`, with the
    /// buffer left intact.
    ///
    /// # Errors
    /// `LockTimeout` if the lock stayed busy, `StaleHandle` if the buffer is
    /// already gone.
    pub fn destroy(&self, handle: BufferHandle, timeout: Duration) -> Result<(), BufferError> {
        self.detach(handle, timeout).map(drop)
    }

    /// Like [`Self::destroy`], but hand the stream back instead of dropping it
    ///
    /// # Errors
    /// Same as [`Self::destroy`].
    pub fn detach(
        &self,
        handle: BufferHandle,
        timeout: Duration,
    ) -> Result<BoxedStream, BufferError> {
        let cell = self.cell(&handle)?;
        let Some(mut guard) = cell.try_lock_for(timeout) else {
            log::warn!("sbuf.destroy: {} still locked after {timeout:?}", handle.id);
            return Err(BufferError::LockTimeout(timeout));
        };
        let stream = guard.take().ok_or(BufferError::StaleHandle(handle.id))?;
        drop(guard);

        self.table.write().retire(handle.id);
        log::debug!("sbuf.destroy: {} released", handle.id);
        Ok(stream)
    }

    /// Number of table slots ever used
    #[must_use]
    pub fn count_used(&self) -> usize {
        self.table.read().used()
    }

    /// Number of buffers not yet destroyed
    #[must_use]
    pub fn count_live(&self) -> usize {
        self.table.read().live()
    }

    /// Table capacity
    #[must_use]
    pub fn count_allocated(&self) -> usize {
        self.table.read().allocated()
    }
}

impl Default for BufferRegistry {
    fn default() -> Self {
        Self::new()
    }
}
