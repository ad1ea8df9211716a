//! Log manager configuration and log directory resolution

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use super::format::LINE_MAX_CHARS;
use super::severity::Severity;
use super::LogError;
use crate::io::OpenMode;

/// Environment variable naming the log directory
pub const LOG_DIR_ENV: &str = "HANDLEREG_LOG_DIR";

/// Environment variable holding the most verbose severity to record
pub const LOG_SEVERITY_ENV: &str = "HANDLEREG_LOG_SEVERITY";

/// Where the log directory comes from
pub trait LogDirSource: Send + Sync {
    /// Directory that log files live in
    ///
    /// # Errors
    /// `DirUnavailable` when the source has no directory to offer.
    fn resolve(&self) -> Result<PathBuf, LogError>;
}

/// Log directory read from an environment variable on every lookup
#[derive(Debug, Clone)]
pub struct EnvLogDir {
    var: String,
}

impl EnvLogDir {
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvLogDir {
    fn default() -> Self {
        Self::new(LOG_DIR_ENV)
    }
}

impl LogDirSource for EnvLogDir {
    fn resolve(&self) -> Result<PathBuf, LogError> {
        std::env::var_os(&self.var)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| LogError::DirUnavailable(format!("${} is not set", self.var)))
    }
}

/// Log directory fixed at construction
#[derive(Debug, Clone)]
pub struct FixedLogDir(pub PathBuf);

impl LogDirSource for FixedLogDir {
    fn resolve(&self) -> Result<PathBuf, LogError> {
        Ok(self.0.clone())
    }
}

/// Fail unless `dir` is readable and writable by this process
///
/// # Errors
/// `DirInaccessible` carrying the OS error.
pub fn check_access(dir: &Path) -> Result<(), LogError> {
    let inaccessible = |source| LogError::DirInaccessible {
        path: dir.to_path_buf(),
        source,
    };
    let c_path = CString::new(dir.as_os_str().as_bytes()).map_err(|_| {
        inaccessible(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path contains a NUL byte",
        ))
    })?;
    // SAFETY: c_path is a valid NUL-terminated string for the whole call.
    let rc = unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK) };
    if rc < 0 {
        return Err(inaccessible(std::io::Error::last_os_error()));
    }
    Ok(())
}

/// Settings for a [`super::LogManager`]
pub struct LogConfig {
    pub dir: Box<dyn LogDirSource>,
    /// Longest line of a formatted message, in characters
    pub line_width: usize,
    /// Records more verbose than this are dropped
    pub max_severity: Severity,
    /// Mode used when a write has to open the log itself
    pub default_mode: OpenMode,
}

impl LogConfig {
    /// Defaults with the log directory fixed to `dir`
    #[must_use]
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Box::new(FixedLogDir(dir.into())),
            ..Self::default()
        }
    }

    /// Defaults, with the severity threshold taken from
    /// `HANDLEREG_LOG_SEVERITY` when it is set and valid
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(LOG_SEVERITY_ENV) {
            match value.parse::<Severity>() {
                Ok(severity) => config.max_severity = severity,
                Err(e) => log::warn!("config: ignoring ${LOG_SEVERITY_ENV}: {e}"),
            }
        }
        config
    }

    #[must_use]
    pub fn line_width(mut self, width: usize) -> Self {
        self.line_width = width;
        self
    }

    #[must_use]
    pub fn max_severity(mut self, severity: Severity) -> Self {
        self.max_severity = severity;
        self
    }

    #[must_use]
    pub fn default_mode(mut self, mode: OpenMode) -> Self {
        self.default_mode = mode;
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: Box::new(EnvLogDir::default()),
            line_width: LINE_MAX_CHARS,
            max_severity: Severity::Debug,
            default_mode: OpenMode::Append,
        }
    }
}

impl std::fmt::Debug for LogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogConfig")
            .field("line_width", &self.line_width)
            .field("max_severity", &self.max_severity)
            .field("default_mode", &self.default_mode)
            .finish_non_exhaustive()
    }
}
