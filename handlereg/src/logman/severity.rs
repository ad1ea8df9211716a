use std::fmt;
use std::str::FromStr;

/// Classification of a log record, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum Severity {
    Error = 0,
    Warning = 1,
    Status = 2,
    Info = 3,
    Debug = 4,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Self::Error,
        Self::Warning,
        Self::Status,
        Self::Info,
        Self::Debug,
    ];

    /// Map a raw ordinal code; anything out of range is `Info`
    #[must_use]
    pub fn from_code(code: u16) -> Self {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .unwrap_or(Self::Info)
    }

    #[must_use]
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Single-character display symbol used in event lines
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Self::Error => 'E',
            Self::Warning => 'W',
            Self::Status => 'S',
            Self::Info => 'I',
            Self::Debug => 'D',
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Status => "status",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity: {0:?}")]
pub struct ParseSeverityError(String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    /// Accepts a symbol (`E`, `w`, ...), a name (`error`, `Warning`, ...) or
    /// an ordinal code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u16>() {
            return Self::ALL
                .get(usize::from(code))
                .copied()
                .ok_or_else(|| ParseSeverityError(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|sev| {
                s.eq_ignore_ascii_case(sev.name())
                    || (s.len() == 1 && s.eq_ignore_ascii_case(&sev.symbol().to_string()))
            })
            .ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}
