//! Growing degree days.
//!
//! Daily mean air temperature is regularized first, then converted to
//! growing degree days above a base temperature and accumulated per
//! calendar year (the sum restarts on January 1).

use crate::{
    cumulative::YearlyRunningTotal,
    regularize::{forward_fill_observed, DailyValue, FillReport},
};
use chrono::NaiveDate;
use itertools::Itertools;
use log::warn;
use sfa_core::reading::TemperatureReading;
use sfa_utils::missing::mean_present;

/// Growing degree days for one station-day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyGdd {
    pub date: NaiveDate,
    pub mean_air_temp: Option<f64>,
    pub gdd: Option<f64>,
    pub cumulative_gdd: Option<f64>,
}

/// Heat units above `tbase` for a day with mean temperature `mean_temp`.
pub fn growing_degree_days(mean_temp: f64, tbase: f64) -> f64 {
    (mean_temp - tbase).max(0.0)
}

/// Mean air temperature of every calendar day that has at least one reading.
///
/// `readings` must be in chronological order. A day whose readings all lack
/// a temperature yields `None`.
pub fn daily_mean_temperatures(readings: &[TemperatureReading]) -> Vec<DailyValue> {
    readings
        .iter()
        .chunk_by(|r| r.date())
        .into_iter()
        .map(|(date, day)| DailyValue::new(date, mean_present(day.map(|r| r.air_temperature))))
        .collect()
}

/// Convert a regularized daily mean series into daily and cumulative GDD.
///
/// Days without a mean temperature keep empty GDD values and leave the
/// running sum untouched.
pub fn accumulate(days: &[DailyValue], tbase: f64) -> Vec<DailyGdd> {
    let mut running = YearlyRunningTotal::new();
    days.iter()
        .map(|day| {
            let gdd = day.value.map(|t| growing_degree_days(t, tbase));
            let cumulative_gdd = gdd.map(|g| running.add(day.date, g));
            DailyGdd {
                date: day.date,
                mean_air_temp: day.value,
                gdd,
                cumulative_gdd,
            }
        })
        .collect()
}

/// Daily GDD table for one station's chronologically ordered readings.
pub fn station_gdd(
    station_id: &str,
    readings: &[TemperatureReading],
    tbase: f64,
) -> (Vec<DailyGdd>, FillReport) {
    let means = daily_mean_temperatures(readings);
    let regularized = forward_fill_observed(&means);
    let report = regularized.report;
    if report.filled_days > 0 {
        warn!(
            "station {}: {} days within the collection window have no temperature readings; \
             filled with the previous day's mean",
            station_id, report.filled_days
        );
    }
    if report.leading_missing_days > 0 {
        warn!(
            "station {}: first {} days have no temperature value to carry forward; left empty",
            station_id, report.leading_missing_days
        );
    }
    (accumulate(&regularized.days, tbase), report)
}
