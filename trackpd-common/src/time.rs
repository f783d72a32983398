//! Timestamp utilities

use chrono::{DateTime, Local, TimeZone};

/// Capture-time format stamped on ingested samples (24-hour, no seconds)
pub const CAPTURE_TIME_FORMAT: &str = "%H:%M";

/// Get current local timestamp
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Format a capture time as `HH:MM`
pub fn capture_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(CAPTURE_TIME_FORMAT).to_string()
}

/// Check that a string is a well-formed `HH:MM` capture time
pub fn is_capture_time(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    let (Ok(hours), Ok(minutes)) = (value[0..2].parse::<u8>(), value[3..5].parse::<u8>()) else {
        return false;
    };
    bytes[0..2].iter().chain(&bytes[3..5]).all(u8::is_ascii_digit) && hours < 24 && minutes < 60
}
