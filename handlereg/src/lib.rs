//! Locked handle registries for in-memory stream buffers and append-only
//! log files.
//!
//! Both registries share one layout: a growable [`table::HandleTable`] behind a
//! table-wide `RwLock`, and a `parking_lot::Mutex` per entry.

pub mod growth;
pub mod handle;
pub mod io;
pub mod logman;
pub mod sbuf;
pub mod table;

// Re-export handle and table types for convenience
pub use handle::Handle;
pub use table::HandleTable;

// Re-export stream types for convenience
pub use io::{ByteStream, FileStream, MemStream, OpenMode, StreamError};

// Re-export buffer registry
pub use sbuf::{BufferError, BufferGuard, BufferHandle, BufferRegistry};

// Re-export log manager
pub use logman::{LogConfig, LogError, LogManager, LogStatus, Severity};
