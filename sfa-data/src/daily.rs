//! The merged daily temperature table.

use crate::{config::MetricsConfig, freeze_thaw::station_freeze_thaw, gdd::station_gdd};
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use sfa_core::reading::TemperatureReading;
use std::collections::BTreeMap;

/// One row of the daily table.
///
/// Growing degree days and freeze-thaw counts are joined by date; a field
/// is empty when its series does not cover the day or has no value to
/// carry forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTemperatureRecord {
    pub station_id: String,
    pub date: NaiveDate,
    pub mean_air_temp: Option<f64>,
    pub gdd: Option<f64>,
    pub cumulative_gdd: Option<f64>,
    pub freeze_thaw_count: Option<f64>,
}

impl DailyTemperatureRecord {
    fn empty(station_id: &str, date: NaiveDate) -> Self {
        DailyTemperatureRecord {
            station_id: station_id.to_string(),
            date,
            mean_air_temp: None,
            gdd: None,
            cumulative_gdd: None,
            freeze_thaw_count: None,
        }
    }
}

/// Daily rows for one station's chronologically ordered readings.
pub fn station_daily(
    station_id: &str,
    readings: &[TemperatureReading],
    config: &MetricsConfig,
) -> Vec<DailyTemperatureRecord> {
    let (gdd_days, _) = station_gdd(station_id, readings, config.gdd_base);
    let (frthw_days, _) = station_freeze_thaw(station_id, readings, config.freeze_thaw_threshold);

    let mut rows: BTreeMap<NaiveDate, DailyTemperatureRecord> = BTreeMap::new();
    for day in gdd_days {
        let row = rows
            .entry(day.date)
            .or_insert_with(|| DailyTemperatureRecord::empty(station_id, day.date));
        row.mean_air_temp = day.mean_air_temp;
        row.gdd = day.gdd;
        row.cumulative_gdd = day.cumulative_gdd;
    }
    for day in frthw_days {
        rows.entry(day.date)
            .or_insert_with(|| DailyTemperatureRecord::empty(station_id, day.date))
            .freeze_thaw_count = day.value;
    }
    rows.into_values().collect()
}

/// The daily table for every station in `readings`, ordered by station then date.
pub fn daily_table(
    readings: Vec<TemperatureReading>,
    config: &MetricsConfig,
) -> Vec<DailyTemperatureRecord> {
    let stations = TemperatureReading::by_station(readings);
    let mut table = Vec::new();
    for (station_id, series) in &stations {
        let rows = station_daily(station_id, series, config);
        info!("station {}: {} daily rows", station_id, rows.len());
        table.extend(rows);
    }
    table
}
