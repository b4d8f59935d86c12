use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{ExporterError, Result};

pub fn parse_duration_str(input: &str) -> Result<Duration> {
    humantime::parse_duration(input)
        .map_err(|e| ExporterError::Config(format!("invalid duration {input}: {e}")))
}

/// `None` for zero or out-of-range timestamps.
pub fn datetime_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}
