//! Registry of append-only log files
//!
//! Maps log names to files under the configured log directory. Each name gets
//! one table entry for the lifetime of the manager; closing a log releases the
//! file but keeps the entry and its lock for a later reopen.
//!
//! Locking follows [`crate::sbuf`]: a table-wide `RwLock` for lookups and
//! appends, one `parking_lot::Mutex` per log serializing writers.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use parking_lot::{Mutex, RwLock};

use super::config::{check_access, LogConfig};
use super::format::{self, Identity, LINE_MAX_CHARS, MESSAGE_MAX_CHARS};
use super::severity::Severity;
use super::LogError;
use crate::io::{ByteStream, FileStream, OpenMode, StreamError};
use crate::table::HandleTable;

/// Lifecycle state of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    /// Registered, never opened through `open`
    Uninitialized,
    Open,
    Closed,
}

struct LogState {
    status: LogStatus,
    stream: Option<FileStream>,
    event: String,
    message: String,
}

impl LogState {
    fn new(stream: Option<FileStream>) -> Self {
        Self {
            status: if stream.is_some() {
                LogStatus::Open
            } else {
                LogStatus::Uninitialized
            },
            stream,
            event: String::with_capacity(LINE_MAX_CHARS + 1),
            message: String::with_capacity(MESSAGE_MAX_CHARS),
        }
    }

    fn is_open(&self) -> bool {
        self.status == LogStatus::Open
    }

    fn attach(&mut self, stream: FileStream) {
        self.stream = Some(stream);
        self.status = LogStatus::Open;
    }

    /// Flush and drop the file. The entry counts as closed even if the final
    /// flush fails.
    fn close(&mut self) -> Result<(), StreamError> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        self.status = LogStatus::Closed;
        stream.into_file().map(drop)
    }

    fn write_record(
        &mut self,
        severity: Severity,
        message: Option<&str>,
        width: usize,
    ) -> Result<(), StreamError> {
        self.event.clear();
        format::event_line(
            &mut self.event,
            severity,
            Local::now().naive_local(),
            Identity::current(),
        );
        self.message.clear();
        format::message_body(&mut self.message, message, width);

        let Some(stream) = self.stream.as_mut() else {
            return Err(StreamError::Io(std::io::ErrorKind::NotConnected.into()));
        };
        stream.write_all(self.event.as_bytes())?;
        stream.write_all(self.message.as_bytes())?;
        stream.flush()
    }
}

struct LogEntry {
    name: String,
    path: PathBuf,
    state: Mutex<LogState>,
}

impl LogEntry {
    fn new(name: &str, path: PathBuf, stream: Option<FileStream>) -> Self {
        Self {
            name: name.to_string(),
            path,
            state: Mutex::new(LogState::new(stream)),
        }
    }

    fn open(&self, mode: OpenMode) -> Result<(), LogError> {
        let mut state = self.state.lock();
        if state.is_open() {
            return Ok(());
        }
        let stream =
            FileStream::open(&self.path, mode).map_err(|e| LogError::stream(&self.name, e))?;
        state.attach(stream);
        log::debug!("log.open: reopened {} ({mode})", self.path.display());
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), LogError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(&['/', '\0'][..])
        || name.contains(std::path::MAIN_SEPARATOR);
    if bad {
        return Err(LogError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Registry of named log files
pub struct LogManager {
    config: LogConfig,
    table: RwLock<HandleTable<Arc<LogEntry>>>,
}

impl LogManager {
    #[must_use]
    pub fn new(config: LogConfig) -> Self {
        Self {
            config,
            table: RwLock::new(HandleTable::new()),
        }
    }

    /// Manager whose table starts with room for `page` logs
    #[must_use]
    pub fn with_page(config: LogConfig, page: usize) -> Self {
        Self {
            config,
            table: RwLock::new(HandleTable::with_page(page)),
        }
    }

    #[must_use]
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Resolve the log directory and make sure it is usable
    ///
    /// # Errors
    /// `DirUnavailable` or `DirInaccessible`.
    pub fn log_dir(&self) -> Result<PathBuf, LogError> {
        let dir = self.config.dir.resolve()?;
        check_access(&dir)?;
        Ok(dir)
    }

    fn entry(&self, name: &str) -> Option<Arc<LogEntry>> {
        self.table.read().iter().find(|e| e.name == name).cloned()
    }

    /// Table index of the named log
    #[must_use]
    pub fn find_id(&self, name: &str) -> Option<usize> {
        self.table.read().position(|e| e.name == name)
    }

    #[must_use]
    pub fn is_open(&self, name: &str) -> bool {
        self.status(name) == Some(LogStatus::Open)
    }

    /// Lifecycle state of the named log, `None` if it was never registered
    #[must_use]
    pub fn status(&self, name: &str) -> Option<LogStatus> {
        let entry = self.entry(name)?;
        let status = entry.state.lock().status;
        Some(status)
    }

    /// Path of the named log file, if registered
    #[must_use]
    pub fn path(&self, name: &str) -> Option<PathBuf> {
        self.entry(name).map(|e| e.path.clone())
    }

    /// Where the named log lives or would be created
    ///
    /// # Errors
    /// Directory or name failures.
    pub fn resolve_path(&self, name: &str) -> Result<PathBuf, LogError> {
        if let Some(path) = self.path(name) {
            return Ok(path);
        }
        let dir = self.log_dir()?;
        validate_name(name)?;
        Ok(dir.join(name))
    }

    /// Number of registered logs
    #[must_use]
    pub fn logs_used(&self) -> usize {
        self.table.read().used()
    }

    /// Table capacity
    #[must_use]
    pub fn logs_allocated(&self) -> usize {
        self.table.read().allocated()
    }

    /// Open the named log, registering it on first use
    ///
    /// Opening an open log is a no-op; a closed one is reopened at its
    /// original path. A new entry is only added once its file has been
    /// opened, so a failed open leaves nothing behind.
    ///
    /// # Errors
    /// Directory, name or I/O failures.
    pub fn open(&self, name: &str, mode: OpenMode) -> Result<(), LogError> {
        let dir = self.log_dir()?;
        validate_name(name)?;

        if let Some(entry) = self.entry(name) {
            return entry.open(mode);
        }

        let mut table = self.table.write();
        let existing = table.iter().find(|e| e.name == name).cloned();
        if let Some(entry) = existing {
            drop(table);
            return entry.open(mode);
        }
        let path = dir.join(name);
        let stream = FileStream::open(&path, mode).map_err(|e| LogError::stream(name, e))?;
        let id = table.insert(Arc::new(LogEntry::new(name, path, Some(stream))));
        log::debug!(
            "log.open: registered {name} at {id} ({mode}, used {}, allocated {})",
            table.used(),
            table.allocated()
        );
        Ok(())
    }

    /// Close the named log, keeping its entry for a later reopen
    ///
    /// # Errors
    /// `NotFound` for unknown names, or the I/O error of the final flush.
    pub fn close(&self, name: &str) -> Result<(), LogError> {
        let entry = self
            .entry(name)
            .ok_or_else(|| LogError::NotFound(name.to_string()))?;
        let result = entry.state.lock().close();
        result.map_err(|e| LogError::stream(name, e))
    }

    /// Close every open log
    ///
    /// Keeps going after a failure and reports the first one.
    ///
    /// # Errors
    /// The first close failure.
    pub fn close_all(&self) -> Result<(), LogError> {
        let entries: Vec<Arc<LogEntry>> = self.table.read().iter().cloned().collect();
        let mut first_error = None;
        for entry in entries {
            let result = entry.state.lock().close();
            if let Err(e) = result {
                log::warn!("log.close_all: {}: {e}", entry.name);
                first_error.get_or_insert(LogError::stream(&entry.name, e));
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn is_filtered(&self, severity: Severity) -> bool {
        severity > self.config.max_severity
    }

    /// Append one record to an open log
    ///
    /// # Errors
    /// `NotOpen` unless the log is open, or the I/O error of the write.
    pub fn write(
        &self,
        name: &str,
        severity: Severity,
        message: Option<&str>,
    ) -> Result<(), LogError> {
        let entry = self
            .entry(name)
            .ok_or_else(|| LogError::NotOpen(name.to_string()))?;
        let mut state = entry.state.lock();
        if !state.is_open() {
            return Err(LogError::NotOpen(name.to_string()));
        }
        if self.is_filtered(severity) {
            return Ok(());
        }
        state
            .write_record(severity, message, self.config.line_width)
            .map_err(|e| LogError::stream(name, e))
    }

    /// Append one record, opening the log just for this write if needed
    ///
    /// A log that was closed before the call is closed again afterwards. The
    /// open, the write and the close all run under the log's lock, so other
    /// callers never see the temporary open state. A log that is already
    /// open is written without consulting the log directory.
    ///
    /// # Errors
    /// Directory, name or I/O failures.
    pub fn write_with_autoopen(
        &self,
        name: &str,
        severity: Severity,
        message: Option<&str>,
    ) -> Result<(), LogError> {
        if self.is_filtered(severity) {
            return Ok(());
        }
        let entry = match self.entry(name) {
            Some(entry) => entry,
            None => self.register_closed(name)?,
        };

        let mut state = entry.state.lock();
        let opened_here = !state.is_open();
        if opened_here {
            self.log_dir()?;
            let stream = FileStream::open(&entry.path, self.config.default_mode)
                .map_err(|e| LogError::stream(name, e))?;
            state.attach(stream);
        }

        let written = state.write_record(severity, message, self.config.line_width);
        let closed = if opened_here { state.close() } else { Ok(()) };
        written.and(closed).map_err(|e| LogError::stream(name, e))
    }

    /// Add an entry without opening it
    ///
    /// The path is checked by creating the file in append mode and closing it
    /// again, so a bad path never leaves an entry behind and existing content
    /// is kept. The caller opens it for real under the entry lock.
    fn register_closed(&self, name: &str) -> Result<Arc<LogEntry>, LogError> {
        let dir = self.log_dir()?;
        validate_name(name)?;

        let mut table = self.table.write();
        let existing = table.iter().find(|e| e.name == name).cloned();
        if let Some(entry) = existing {
            return Ok(entry);
        }
        let path = dir.join(name);
        FileStream::open(&path, OpenMode::Append)
            .and_then(FileStream::into_file)
            .map_err(|e| LogError::stream(name, e))?;
        let entry = Arc::new(LogEntry::new(name, path, None));
        let id = table.insert(Arc::clone(&entry));
        log::debug!("log.write: registered {name} at {id} for a single write");
        Ok(entry)
    }
}

impl Drop for LogManager {
    fn drop(&mut self) {
        if let Err(e) = self.close_all() {
            log::warn!("log manager shutdown: {e}");
        }
    }
}
