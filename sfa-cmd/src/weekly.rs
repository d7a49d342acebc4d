//! Weekly sap production summaries.

use crate::output::{write_table, OutputFormat};
use anyhow::Context;
use log::{info, warn};
use sfa_core::{
    reading::SapSugarReading,
    table::open_table,
    tree::{TreeIndex, TreeInfo},
};
use sfa_data::weekly::{weekly_table, Selector, WeeklyFilter, WeeklyRecord, WeeklySummaryRecord};
use std::path::Path;

fn selector(value: &str) -> Selector {
    match value.parse() {
        Ok(selector) => selector,
        Err(never) => match never {},
    }
}

/// Build a filter from command line selector strings.
pub fn parse_filter(site: &str, tree: &str, tap: &str, years: &str, species: &str) -> WeeklyFilter {
    WeeklyFilter {
        site: selector(site),
        tree: selector(tree),
        tap: selector(tap),
        year: selector(years),
        species: selector(species),
    }
}

/// Load the optional tree metadata table.
pub fn load_trees(trees_csv: Option<&str>) -> anyhow::Result<TreeIndex> {
    let Some(path) = trees_csv else {
        info!("No tree metadata given; weekly rows will have no site");
        return Ok(TreeIndex::new());
    };
    let reader = open_table(Path::new(path)).with_context(|| format!("opening {}", path))?;
    let trees = TreeInfo::from_reader(reader).with_context(|| format!("reading tree table {}", path))?;
    info!("Loaded {} trees from {}", trees.len(), path);
    Ok(TreeInfo::index(trees))
}

/// Run the weekly subcommand.
pub fn run_weekly(
    sap_csv: &str,
    trees_csv: Option<&str>,
    output: Option<&str>,
    summary: Option<&str>,
    filter: &WeeklyFilter,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let trees = load_trees(trees_csv)?;
    if trees.is_empty() && (filter.site != Selector::All || filter.species != Selector::All) {
        warn!("Site or species filter given without tree metadata; every tap will be excluded");
    }
    let reader = open_table(Path::new(sap_csv)).with_context(|| format!("opening {}", sap_csv))?;
    let readings = SapSugarReading::from_reader(reader).context("reading sap table")?;
    info!("Summarizing {} sap readings", readings.len());

    let table: Vec<WeeklyRecord> = weekly_table(readings, &trees, filter);
    write_table(&table, output, format)?;
    info!(
        "Weekly table complete. {} rows written to {}",
        table.len(),
        output.unwrap_or("stdout")
    );

    if let Some(summary_path) = summary {
        let rows: Vec<WeeklySummaryRecord> = table.iter().map(WeeklySummaryRecord::from).collect();
        write_table(&rows, Some(summary_path), format)?;
        info!("Weekly summary written to {}", summary_path);
    }
    Ok(())
}
