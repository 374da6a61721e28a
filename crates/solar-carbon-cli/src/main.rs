mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::prices::PricesArgs;
use commands::proposal::ProposalArgs;
use commands::revenue::{RevenueArgs, ScheduleArgs};
use commands::sizing::{EnergyArgs, NormalizeArgs, SharesArgs};

/// Solar carbon credit and revenue projections
#[derive(Parser)]
#[command(
    name = "carbon-calc",
    version,
    about = "Solar carbon credit and revenue projections",
    long_about = "Converts solar system sizes into annual energy, carbon credits and \
                  projected carbon revenue, split between client, referring agent and \
                  platform. Prices are read from a JSON table or a settings endpoint."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Path to an engine configuration JSON file
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a system size to kWp
    Normalize(NormalizeArgs),
    /// Annual energy and carbon credits for a system
    Energy(EnergyArgs),
    /// Client / agent / platform split for a portfolio size
    Shares(SharesArgs),
    /// Current and future carbon prices
    Prices(PricesArgs),
    /// Projected carbon revenue per year
    Revenue(RevenueArgs),
    /// Dense year-by-year projection through the horizon
    Schedule(ScheduleArgs),
    /// Proposal metrics from a JSON proposal
    Proposal(ProposalArgs),
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

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("solar_carbon_core=info,carbon_calc=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config = match commands::load_engine_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Normalize(args) => commands::sizing::run_normalize(args),
        Commands::Energy(args) => commands::sizing::run_energy(args, &config),
        Commands::Shares(args) => commands::sizing::run_shares(args),
        Commands::Prices(args) => commands::prices::run_prices(args, &config).await,
        Commands::Revenue(args) => commands::revenue::run_revenue(args, &config).await,
        Commands::Schedule(args) => commands::revenue::run_schedule(args, &config).await,
        Commands::Proposal(args) => commands::proposal::run_proposal(args, &config).await,
        Commands::Version => {
            println!("carbon-calc {}", env!("CARGO_PKG_VERSION"));
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
