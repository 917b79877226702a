//! Peak-hour classification.
//!
//! This module decides whether a client-supplied time falls in a peak
//! window for a service class. Times arrive as free text; anything that
//! cannot be parsed classifies as non-peak rather than failing, so an
//! ambiguous client timestamp never blocks checkout.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};

use crate::config::{PeakWindow, PeakWindows};
use crate::models::ServiceClass;

/// Extracts the hour (0-23) from a free-text time.
///
/// Accepts wall-clock times (`HH:MM`, `HH:MM:SS`) and points in time
/// (RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`). Only the hour
/// component is kept. Returns `None` for anything unparsable.
///
/// # Example
///
/// ```
/// use fare_engine::calculation::parse_clock_hour;
///
/// assert_eq!(parse_clock_hour("09:30"), Some(9));
/// assert_eq!(parse_clock_hour("2025-04-01T22:15:00+05:30"), Some(22));
/// assert_eq!(parse_clock_hour("tomorrow-ish"), None);
/// ```
pub fn parse_clock_hour(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M:%S") {
        return Some(time.hour());
    }
    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M") {
        return Some(time.hour());
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.hour());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime.hour());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(datetime.hour());
    }

    None
}

/// Returns true if the hour falls inside any of the windows.
///
/// Windows are half-open `[start, end)`. A window whose start is above its
/// end wraps past midnight and matches `hour >= start || hour < end`.
fn hour_in_windows(hour: u32, windows: &[PeakWindow]) -> bool {
    windows.iter().any(|window| {
        if window.start <= window.end {
            hour >= window.start && hour < window.end
        } else {
            hour >= window.start || hour < window.end
        }
    })
}

/// Classifies a client-supplied time as peak or non-peak for a service class.
///
/// # Arguments
///
/// * `raw_time` - The client-supplied time text
/// * `class` - The service class selecting the peak window set
/// * `windows` - The configured peak windows
///
/// # Returns
///
/// `true` if the time parses and its hour falls in a peak window for the
/// class; `false` otherwise, including for malformed input. Never fails.
///
/// # Example
///
/// ```
/// use fare_engine::calculation::is_peak;
/// use fare_engine::config::{PeakWindow, PeakWindows};
/// use fare_engine::models::ServiceClass;
///
/// let windows = PeakWindows {
///     city: vec![PeakWindow { start: 7, end: 11 }],
///     airport: vec![PeakWindow { start: 22, end: 6 }],
/// };
/// assert!(is_peak("09:00", ServiceClass::City, &windows));
/// assert!(!is_peak("12:00", ServiceClass::City, &windows));
/// assert!(is_peak("23:45", ServiceClass::Airport, &windows));
/// ```
pub fn is_peak(raw_time: &str, class: ServiceClass, windows: &PeakWindows) -> bool {
    match parse_clock_hour(raw_time) {
        Some(hour) => hour_in_windows(hour, windows.windows_for(class)),
        None => false,
    }
}
