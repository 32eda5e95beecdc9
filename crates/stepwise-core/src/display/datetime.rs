//! Timestamp display.

use std::fmt;

use jiff::{tz::TimeZone, Timestamp};

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS TZ`, in the system time zone
/// unless another zone is given.
pub struct LocalDateTime<'a> {
    timestamp: &'a Timestamp,
    tz: Option<TimeZone>,
}

impl<'a> LocalDateTime<'a> {
    pub fn new(timestamp: &'a Timestamp) -> Self {
        Self {
            timestamp,
            tz: None,
        }
    }

    pub fn in_zone(timestamp: &'a Timestamp, tz: TimeZone) -> Self {
        Self {
            timestamp,
            tz: Some(tz),
        }
    }
}

impl fmt::Display for LocalDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tz = self.tz.clone().unwrap_or_else(TimeZone::system);
        write!(
            f,
            "{}",
            self.timestamp.to_zoned(tz).strftime("%Y-%m-%d %H:%M:%S %Z")
        )
    }
}
