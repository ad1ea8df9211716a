//! Byte streams
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  BufferRegistry / LogManager        │
//! │  - table of locked entries          │
//! └─────────────────────────────────────┘
//!          ▲
//!          │ one stream per entry
//!          ▼
//! ┌─────────────────────────────────────┐
//! │  ByteStream (trait)                 │
//! │  - getc / putc / rewind / flush     │
//! └─────────────────────────────────────┘
//!      ▲                 ▲
//!      │                 │
//!   MemStream        FileStream
//! ```

pub mod file;
pub mod memstream;
pub mod types;

pub use file::FileStream;
pub use memstream::MemStream;
pub use types::{ByteStream, OpenMode, StreamError};
