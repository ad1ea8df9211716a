//! Record formatting: event line and word-wrapped message body

use std::fmt::Write as _;

use chrono::NaiveDateTime;

use super::severity::Severity;

/// Longest line a formatted message may contain, in characters
pub const LINE_MAX_CHARS: usize = 80;

/// Initial capacity of the message scratch buffer
pub const MESSAGE_MAX_CHARS: usize = 1024;

/// Marker closing every record
pub const ENTRY_DELIMITER: &str = "\t--\n";

/// Sub-second field of the event line; not measured yet
const SUBSECOND_FIELD: &str = "0000";

/// Process persona recorded in every event line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub euid: libc::uid_t,
    pub egid: libc::gid_t,
    pub uid: libc::uid_t,
    pub gid: libc::gid_t,
}

impl Identity {
    /// Effective and real user/group ids of this process
    #[must_use]
    pub fn current() -> Self {
        // SAFETY: the get*id calls take no arguments and always succeed.
        unsafe {
            Self {
                euid: libc::geteuid(),
                egid: libc::getegid(),
                uid: libc::getuid(),
                gid: libc::getgid(),
            }
        }
    }
}

/// Append the event line for a record, newline included
///
/// `2024-05-01 13:07:55 0000 I   1000   1000   1000   1000`
pub fn event_line(out: &mut String, severity: Severity, at: NaiveDateTime, who: Identity) {
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "{} {SUBSECOND_FIELD} {} {:6} {:6} {:6} {:6}",
        at.format("%Y-%m-%d %H:%M:%S"),
        severity.symbol(),
        who.euid,
        who.egid,
        who.uid,
        who.gid,
    );
}

fn is_boundary(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_punctuation()
}

/// Append `message` wrapped so that no line exceeds `width` characters
///
/// Messages that already fit are copied verbatim. Longer ones break after the
/// last whitespace or punctuation that fits on the line; a whitespace break
/// point is replaced by the newline. Only a run of word characters longer than
/// `width` is split.
pub fn wrap_message(message: &str, width: usize, out: &mut String) {
    let width = width.max(1);
    if message.chars().count() <= width {
        out.push_str(message);
        return;
    }

    let chars: Vec<char> = message.chars().collect();
    let mut start = 0;
    while start < chars.len() {
        let limit = (start + width).min(chars.len());
        let window = &chars[start..limit];

        if let Some(nl) = window.iter().position(|&c| c == '\n') {
            out.extend(&window[..=nl]);
            start += nl + 1;
            continue;
        }
        if limit == chars.len() {
            out.extend(window);
            break;
        }
        if chars[limit].is_whitespace() {
            out.extend(window);
            out.push('\n');
            start = limit + 1;
            continue;
        }

        match window.iter().rposition(|&c| is_boundary(c)) {
            Some(0) if window[0].is_whitespace() => {
                // leading blank, nothing to put on this line
                start += 1;
            }
            Some(b) if window[b].is_whitespace() => {
                out.extend(&window[..b]);
                out.push('\n');
                start += b + 1;
            }
            Some(b) => {
                out.extend(&window[..=b]);
                out.push('\n');
                start += b + 1;
            }
            None => {
                out.extend(window);
                out.push('\n');
                start = limit;
            }
        }
    }
}

/// Append the body of a record: wrapped message, newline, delimiter
///
/// A missing message is written as a bare delimiter.
pub fn message_body(out: &mut String, message: Option<&str>, width: usize) {
    match message {
        Some(message) => wrap_message(message, width, out),
        None => out.push_str(ENTRY_DELIMITER),
    }
    out.push('\n');
    out.push_str(ENTRY_DELIMITER);
}
