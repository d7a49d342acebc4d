//! Table writers for the derived tables.

use anyhow::Context;
use clap::ValueEnum;
use serde::Serialize;
use sfa_data::{
    daily::DailyTemperatureRecord,
    weekly::{WeeklyRecord, WeeklySummaryRecord},
};
use std::{fs::File, io::BufWriter, io::Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

/// A row type with a fixed CSV header, so empty tables still carry one.
pub trait TableRow: Serialize {
    const HEADER: &'static [&'static str];
}

impl TableRow for DailyTemperatureRecord {
    const HEADER: &'static [&'static str] = &[
        "station_id",
        "date",
        "mean_air_temp",
        "gdd",
        "cumulative_gdd",
        "freeze_thaw_count",
    ];
}

impl TableRow for WeeklyRecord {
    const HEADER: &'static [&'static str] = &[
        "tap_id",
        "tree_id",
        "site",
        "year",
        "date",
        "date_from",
        "date_to",
        "day_of_year_from",
        "day_of_year_to",
        "cumulative_sap",
        "cumulative_sugar_weight",
        "trailing_7day_sap",
        "trailing_7day_sugar_weight",
        "cumulative_syrup_litres",
        "trailing_7day_syrup_litres",
    ];
}

impl TableRow for WeeklySummaryRecord {
    const HEADER: &'static [&'static str] = &[
        "site",
        "date_from",
        "date_to",
        "trailing_7day_sap",
        "trailing_7day_sugar_weight",
    ];
}

/// Write `rows` to `writer` in `format`.
pub fn write_rows<T: TableRow, W: Write>(rows: &[T], writer: W, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
            if rows.is_empty() {
                wtr.write_record(T::HEADER)?;
            }
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, rows)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

/// Write `rows` to the file at `path`, or to stdout when no path is given.
pub fn write_table<T: TableRow>(rows: &[T], path: Option<&str>, format: OutputFormat) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path))?;
            write_rows(rows, BufWriter::new(file), format).with_context(|| format!("writing {}", path))
        }
        None => {
            let stdout = std::io::stdout();
            write_rows(rows, stdout.lock(), format).context("writing to stdout")
        }
    }
}
