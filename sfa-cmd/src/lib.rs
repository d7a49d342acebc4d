//! Command implementations for SFA CLI.
//!
//! Provides subcommands that read the upstream temperature and sap tables
//! and write the derived daily and weekly tables.

use clap::Subcommand;
use sfa_data::config::{DEFAULT_FREEZE_THAW_THRESHOLD, DEFAULT_GDD_BASE, DEFAULT_SPECIES};

pub mod daily;
pub mod output;
pub mod weekly;

use output::OutputFormat;

#[derive(Subcommand)]
pub enum Command {
    /// Derive daily growing degree days and freeze-thaw counts per station
    Daily {
        /// Temperature table: station_id,timestamp,air_temperature (.csv or .csv.gz)
        #[arg(short = 't', long)]
        temperature_csv: String,

        /// Output path for the daily table (stdout if omitted)
        #[arg(short = 'o', long)]
        output: Option<String>,

        /// Growing degree day base temperature (°C)
        #[arg(long, default_value_t = DEFAULT_GDD_BASE)]
        gdd_base: f64,

        /// Freeze-thaw threshold temperature (°C)
        #[arg(long, default_value_t = DEFAULT_FREEZE_THAW_THRESHOLD)]
        ft_threshold: f64,

        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },

    /// Derive weekly sap, sugar and syrup production per tap
    Weekly {
        /// Sap table: tap_id,tree_id,timestamp,sap_weight,sugar_content (.csv or .csv.gz)
        #[arg(short = 's', long)]
        sap_csv: String,

        /// Tree metadata table: tree_id,site,species
        #[arg(long)]
        trees_csv: Option<String>,

        /// Output path for the weekly table (stdout if omitted)
        #[arg(short = 'o', long)]
        output: Option<String>,

        /// Also write the site-level weekly summary to this path
        #[arg(long)]
        summary: Option<String>,

        /// Sites to include, comma separated, or "all"
        #[arg(long, default_value = "all")]
        site: String,

        /// Trees to include, comma separated, or "all"
        #[arg(long, default_value = "all")]
        tree: String,

        /// Taps to include, comma separated, or "all"
        #[arg(long, default_value = "all")]
        tap: String,

        /// Years to include, comma separated, or "all"
        #[arg(long, default_value = "all")]
        years: String,

        /// Species codes to include, comma separated, or "all"
        #[arg(long, default_value = DEFAULT_SPECIES)]
        species: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Daily {
            temperature_csv,
            output,
            gdd_base,
            ft_threshold,
            format,
        } => {
            let config = sfa_data::config::MetricsConfig {
                gdd_base,
                freeze_thaw_threshold: ft_threshold,
            };
            daily::run_daily(&temperature_csv, output.as_deref(), &config, format)
        }
        Command::Weekly {
            sap_csv,
            trees_csv,
            output,
            summary,
            site,
            tree,
            tap,
            years,
            species,
            format,
        } => {
            let filter = weekly::parse_filter(&site, &tree, &tap, &years, &species);
            weekly::run_weekly(
                &sap_csv,
                trees_csv.as_deref(),
                output.as_deref(),
                summary.as_deref(),
                &filter,
                format,
            )
        }
    }
}
