//! Shared utility functions for SFA crates.

/// Date utility functions
pub mod dates {
    use crate::error::DateError;
    use chrono::{Datelike, NaiveDate, NaiveDateTime};

    /// Timestamp layouts accepted from upstream tables, tried in order.
    pub const TIMESTAMP_FORMATS: [&str; 5] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y%m%d %H%M",
    ];

    /// Parse a reading timestamp.
    ///
    /// Accepts any of [`TIMESTAMP_FORMATS`]; a bare `YYYY-MM-DD` date is
    /// read as midnight of that day.
    pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, DateError> {
        let s = s.trim();
        for format in TIMESTAMP_FORMATS {
            if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(ts);
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| DateError::UnparseableTimestamp(s.to_string()))
    }

    /// Day of the calendar year, January 1 = 1.
    pub fn day_of_year(date: &NaiveDate) -> u32 {
        date.ordinal()
    }

}

/// Missing-value handling for numeric table cells.
pub mod missing {
    use std::num::ParseFloatError;

    /// Values used by weather stations to mark a missing air temperature.
    pub const TEMPERATURE_SENTINELS: [f64; 3] = [999.0, 999.9, 9999.9];

    /// Parse an optional numeric cell. Empty cells, `NA` and `NaN` are missing.
    pub fn parse_optional(s: &str) -> Result<Option<f64>, ParseFloatError> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("nan") {
            return Ok(None);
        }
        let value = s.parse::<f64>()?;
        Ok(value.is_finite().then_some(value))
    }

    /// Drop station sentinel values.
    pub fn mask_temperature_sentinel(value: Option<f64>) -> Option<f64> {
        value.filter(|v| !TEMPERATURE_SENTINELS.contains(v))
    }

    /// Arithmetic mean of the present values, `None` when there are none.
    pub fn mean_present<I>(values: I) -> Option<f64>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let (sum, count) = values
            .into_iter()
            .flatten()
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        (count > 0).then(|| sum / count as f64)
    }

}

/// Error types
pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq)]
    pub enum DateError {
        #[error("unparseable timestamp: {0:?}")]
        UnparseableTimestamp(String),
    }
}
