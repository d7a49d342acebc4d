use crate::{
    error::TableError,
    table::{csv_reader, Columns},
};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};
use sfa_utils::missing::mask_temperature_sentinel;
use std::{collections::BTreeMap, io::Read};

const TEMPERATURE_TABLE: &str = "temperature";
const SAP_TABLE: &str = "sap";

/// A single air temperature reading from a weather station.
///
/// `air_temperature` is `None` when the station reported no value or a
/// missing-value sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub station_id: String,
    pub timestamp: NaiveDateTime,
    pub air_temperature: Option<f64>,
}

impl TemperatureReading {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn year(&self) -> i32 {
        self.timestamp.year()
    }

    /// Parse a temperature table from CSV text.
    pub fn parse_csv(csv_data: &str) -> Result<Vec<TemperatureReading>, TableError> {
        Self::from_reader(csv_data.as_bytes())
    }

    /// Read a temperature table: `station_id,timestamp,air_temperature`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<TemperatureReading>, TableError> {
        let mut rdr = csv_reader(reader);
        let columns = Columns::locate(
            TEMPERATURE_TABLE,
            rdr.headers()?,
            &["station_id", "timestamp", "air_temperature"],
            &[],
        )?;
        let mut readings = Vec::new();
        for (i, row) in rdr.records().enumerate() {
            let record = row?;
            let row = i + 1;
            let air_temperature = columns.number(&record, row, "air_temperature")?;
            readings.push(TemperatureReading {
                station_id: columns.text(&record, "station_id").to_string(),
                timestamp: columns.timestamp(&record, row, "timestamp")?,
                air_temperature: mask_temperature_sentinel(air_temperature),
            });
        }
        debug!("loaded {} temperature readings", readings.len());
        Ok(readings)
    }

    /// Group readings by station, each station's readings in chronological order.
    pub fn by_station(readings: Vec<TemperatureReading>) -> BTreeMap<String, Vec<TemperatureReading>> {
        let mut result: BTreeMap<String, Vec<TemperatureReading>> = BTreeMap::new();
        for reading in readings {
            result
                .entry(reading.station_id.clone())
                .or_default()
                .push(reading);
        }
        for series in result.values_mut() {
            // stable: same-instant readings keep table order
            series.sort_by_key(|r| r.timestamp);
        }
        result
    }
}

/// A single sap collection from one tap.
///
/// `sap_weight` is in the collection unit (kg); `sugar_content` is percent
/// (°Brix). Either may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SapSugarReading {
    pub tap_id: String,
    pub tree_id: String,
    pub timestamp: NaiveDateTime,
    pub sap_weight: Option<f64>,
    pub sugar_content: Option<f64>,
}

impl SapSugarReading {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn year(&self) -> i32 {
        self.timestamp.year()
    }

    /// Parse a sap table from CSV text.
    pub fn parse_csv(csv_data: &str) -> Result<Vec<SapSugarReading>, TableError> {
        Self::from_reader(csv_data.as_bytes())
    }

    /// Read a sap table: `tap_id,tree_id,timestamp,sap_weight,sugar_content`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<SapSugarReading>, TableError> {
        let mut rdr = csv_reader(reader);
        let columns = Columns::locate(
            SAP_TABLE,
            rdr.headers()?,
            &["tap_id", "tree_id", "timestamp", "sap_weight"],
            &["sugar_content"],
        )?;
        let mut readings = Vec::new();
        for (i, row) in rdr.records().enumerate() {
            let record = row?;
            let row = i + 1;
            readings.push(SapSugarReading {
                tap_id: columns.text(&record, "tap_id").to_string(),
                tree_id: columns.text(&record, "tree_id").to_string(),
                timestamp: columns.timestamp(&record, row, "timestamp")?,
                sap_weight: columns.number(&record, row, "sap_weight")?,
                sugar_content: columns.number(&record, row, "sugar_content")?,
            });
        }
        debug!("loaded {} sap readings", readings.len());
        Ok(readings)
    }

    /// Group readings by tap, each tap's readings in chronological order.
    pub fn by_tap(readings: Vec<SapSugarReading>) -> BTreeMap<String, Vec<SapSugarReading>> {
        let mut result: BTreeMap<String, Vec<SapSugarReading>> = BTreeMap::new();
        for reading in readings {
            result.entry(reading.tap_id.clone()).or_default().push(reading);
        }
        for series in result.values_mut() {
            series.sort_by_key(|r| r.timestamp);
        }
        result
    }
}
