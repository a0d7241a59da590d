//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for event times and recording bounds.
pub type Timestamp = DateTime<Utc>;

/// `YYYY-MM-DD HH:MM:SS`, used for recording bounds.
pub const RECORDING_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Render `ts` as `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn format_timestamp(ts: Timestamp) -> String {
    ts.format(RECORDING_FORMAT).to_string()
}
