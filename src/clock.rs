//! Clock-time rendering for log entries.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde_json::Value;

const CLOCK_FORMAT: &str = "%H:%M:%S";

pub fn current_timestamp() -> String {
    Local::now().format(CLOCK_FORMAT).to_string()
}

/// Renders an upstream `time` field as a 24-hour local clock time.
///
/// RFC 3339 strings and epoch-millisecond numbers are understood. A missing
/// or empty value yields the current time; anything unparseable is returned
/// as given.
pub fn format_timestamp(time: Option<&Value>) -> String {
    format_timestamp_in(time, &Local)
}

pub fn format_timestamp_in<Tz>(time: Option<&Value>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match time {
        Some(Value::String(s)) if !s.trim().is_empty() => match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => dt.with_timezone(tz).format(CLOCK_FORMAT).to_string(),
            Err(_) => s.clone(),
        },
        Some(Value::Number(n)) => match n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis) {
            Some(dt) => dt.with_timezone(tz).format(CLOCK_FORMAT).to_string(),
            None => n.to_string(),
        },
        _ => Utc::now().with_timezone(tz).format(CLOCK_FORMAT).to_string(),
    }
}
