//! Display helpers for log entries and dependency rows.
//!
//! Everything here is a pure function of its input: a log entry maps to a
//! [`LogClass`], a class maps to an icon, a status maps to a badge.

use crate::model::{DependencyStatus, LogEntry, LogLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogClass {
    Error,
    Warning,
    Success,
    Info,
    Default,
}

impl LogClass {
    pub fn css_class(self) -> &'static str {
        match self {
            LogClass::Error => "log-error",
            LogClass::Warning => "log-warning",
            LogClass::Success => "log-success",
            LogClass::Info => "log-info",
            LogClass::Default => "log-default",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            LogClass::Error => "❌",
            LogClass::Warning => "⚠️",
            LogClass::Success => "✅",
            LogClass::Info => "ℹ️",
            LogClass::Default => "📝",
        }
    }
}

const ERROR_WORDS: &[&str] = &["error", "failed", "fatal"];
const WARN_WORDS: &[&str] = &["warn"];
const SUCCESS_WORDS: &[&str] = &["success", "completed", "done"];
const INFO_WORDS: &[&str] = &["info", "starting", "running"];

/// Buckets an entry by its explicit level, falling back to keywords in the
/// message text when the level is unset.
pub fn classify(entry: &LogEntry) -> LogClass {
    match entry.level {
        LogLevel::Error => return LogClass::Error,
        LogLevel::Warn => return LogClass::Warning,
        LogLevel::Success => return LogClass::Success,
        LogLevel::Info => return LogClass::Info,
        LogLevel::Unset => {}
    }

    let text = entry.message.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| text.contains(w));

    if has_any(ERROR_WORDS) {
        LogClass::Error
    } else if has_any(WARN_WORDS) {
        LogClass::Warning
    } else if has_any(SUCCESS_WORDS) {
        LogClass::Success
    } else if has_any(INFO_WORDS) {
        LogClass::Info
    } else {
        LogClass::Default
    }
}

pub fn status_badge_class(status: Option<DependencyStatus>) -> &'static str {
    match status {
        Some(DependencyStatus::Discovered) => "badge bg-info",
        Some(DependencyStatus::UpdateAvailable) => "badge bg-success",
        None => "badge bg-secondary",
    }
}

pub fn status_label(status: Option<DependencyStatus>) -> &'static str {
    match status {
        Some(DependencyStatus::Discovered) => "Discovered",
        Some(DependencyStatus::UpdateAvailable) => "Update Available",
        None => "Unknown",
    }
}

const LEVEL_PREFIXES: &[&str] = &["INFO", "WARN", "ERROR", "DEBUG"];

/// Strips a leading ISO-8601 timestamp, a leading `[HH:MM:SS]` and a leading
/// level prefix such as `INFO:`, in that order, then trims.
pub fn clean_message(message: &str) -> String {
    let rest = strip_iso_timestamp(message);
    let rest = strip_bracketed_clock(rest);
    let rest = strip_level_prefix(rest);
    rest.trim().to_string()
}

/// `YYYY-MM-DDTHH:MM:SS.mmmZ` followed by optional whitespace.
fn strip_iso_timestamp(s: &str) -> &str {
    const SHAPE: &[u8] = b"dddd-dd-ddTdd:dd:dd.dddZ";
    if matches_shape(s.as_bytes(), SHAPE) {
        s[SHAPE.len()..].trim_start()
    } else {
        s
    }
}

/// `[HH:MM:SS]` followed by optional whitespace.
fn strip_bracketed_clock(s: &str) -> &str {
    const SHAPE: &[u8] = b"[dd:dd:dd]";
    if matches_shape(s.as_bytes(), SHAPE) {
        s[SHAPE.len()..].trim_start()
    } else {
        s
    }
}

fn strip_level_prefix(s: &str) -> &str {
    for prefix in LEVEL_PREFIXES {
        let n = prefix.len();
        if s.len() > n
            && s.as_bytes()[n] == b':'
            && s.as_bytes()[..n].eq_ignore_ascii_case(prefix.as_bytes())
        {
            return s[n + 1..].trim_start();
        }
    }
    s
}

/// `d` in the shape matches any ASCII digit; every other byte matches itself.
fn matches_shape(input: &[u8], shape: &[u8]) -> bool {
    input.len() >= shape.len()
        && input.iter().zip(shape).all(|(&b, &want)| match want {
            b'd' => b.is_ascii_digit(),
            _ => b == want,
        })
}
