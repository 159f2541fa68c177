mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::cost::CostArgs;
use commands::offers::OffersArgs;
use commands::prices::PricesArgs;
use commands::rank::RankArgs;

/// Employee vehicle leasing cost calculations
#[derive(Parser)]
#[command(
    name = "lrc",
    version,
    about = "Employee vehicle leasing cost calculations",
    long_about = "A CLI for computing employee vehicle leasing costs with decimal \
                  precision. Resolves leasing offers by powertrain category and \
                  model, prices fuel from live station data with static fallbacks, \
                  and ranks vehicle selections by combined monthly cost."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute leasing, fuel and combined cost for one vehicle + offer
    Cost(CostArgs),
    /// Resolve the applicable leasing offers for a category + model
    Offers(OffersArgs),
    /// Build the effective fuel price table for a tier
    Prices(PricesArgs),
    /// Rank vehicle selections by combined monthly cost
    Rank(RankArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Cost(args) => commands::cost::run_cost(args),
        Commands::Offers(args) => commands::offers::run_offers(args),
        Commands::Prices(args) => commands::prices::run_prices(args),
        Commands::Rank(args) => commands::rank::run_rank(args),
        Commands::Version => {
            println!("lrc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
