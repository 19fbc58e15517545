//! Log records carried in the response payload.
//!
//! These are the user-visible records a host renders for an invocation. They
//! live for one invocation only and are never part of the continuation
//! payload. Diagnostic output goes through `tracing` separately.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single user-visible log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Short title of the record
    pub title: String,
    /// Structured details
    pub details: Value,
    /// Microsecond Unix epoch timestamp captured when the record was created
    pub timestamp_usec: i64,
    /// Whether this record describes an error
    pub is_error: bool,
}

impl LogRecord {
    /// Creates a new record stamped with the current time.
    pub fn new(title: impl Into<String>, details: Value, is_error: bool) -> Self {
        Self {
            title: title.into(),
            details,
            timestamp_usec: current_epoch_time_usec(),
            is_error,
        }
    }
}

/// Builds a log record stamped with the current time.
pub fn gen_log(title: impl Into<String>, details: Value, is_error: bool) -> LogRecord {
    LogRecord::new(title, details, is_error)
}

/// Returns the current Unix epoch time in microseconds.
pub fn current_epoch_time_usec() -> i64 {
    Utc::now().timestamp_micros()
}

/// Renders a timestamp for inclusion in log details or props.
///
/// Timestamps are carried as text: `YYYY-MM-DD HH:MM:SS+00:00`, with a
/// six-digit fractional part only when the sub-second part is non-zero.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use extension_handler::log::timestamp_detail;
///
/// let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
/// assert_eq!(timestamp_detail(ts), "2024-03-01 12:30:05+00:00");
/// ```
pub fn timestamp_detail(timestamp: DateTime<Utc>) -> Value {
    let micros = timestamp.nanosecond() / 1_000 % 1_000_000;
    let text = if micros == 0 {
        timestamp.format("%Y-%m-%d %H:%M:%S+00:00").to_string()
    } else {
        format!(
            "{}.{:06}+00:00",
            timestamp.format("%Y-%m-%d %H:%M:%S"),
            micros
        )
    };
    Value::String(text)
}
