//! SFA CLI - Command line tool for deriving sap-flow metrics from
//! weather station and sap collection tables.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "sfa-cli",
    version,
    about = "Sap-flow analysis toolkit: growing degree days, freeze-thaw cycles and weekly sap production"
)]
struct Cli {
    #[command(subcommand)]
    command: sfa_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("sfa-cli {}", env!("CARGO_PKG_VERSION"));
    sfa_cmd::run(cli.command)
}
