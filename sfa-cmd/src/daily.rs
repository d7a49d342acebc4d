//! Daily temperature metrics: growing degree days and freeze-thaw counts.

use crate::output::{write_table, OutputFormat};
use anyhow::Context;
use log::info;
use sfa_core::{reading::TemperatureReading, table::open_table};
use sfa_data::{
    config::MetricsConfig,
    daily::{daily_table, DailyTemperatureRecord},
};
use std::{io::Read, path::Path};

/// Build the daily table from a temperature table.
pub fn daily_from_reader<R: Read>(
    reader: R,
    config: &MetricsConfig,
) -> anyhow::Result<Vec<DailyTemperatureRecord>> {
    let readings = TemperatureReading::from_reader(reader).context("reading temperature table")?;
    info!(
        "Computing daily metrics from {} readings (GDD base {}, freeze-thaw threshold {})",
        readings.len(),
        config.gdd_base,
        config.freeze_thaw_threshold
    );
    Ok(daily_table(readings, config))
}

/// Run the daily subcommand.
pub fn run_daily(
    temperature_csv: &str,
    output: Option<&str>,
    config: &MetricsConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let reader = open_table(Path::new(temperature_csv))
        .with_context(|| format!("opening {}", temperature_csv))?;
    let table = daily_from_reader(reader, config)?;
    write_table(&table, output, format)?;
    info!(
        "Daily table complete. {} rows written to {}",
        table.len(),
        output.unwrap_or("stdout")
    );
    Ok(())
}
