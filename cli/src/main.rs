//! Curvepool CLI - inspect, quote and simulate a two-phase bonding curve pool
//!
//! Pools live in memory; a TOML file describes the parameters, an optional
//! resumed state, funded accounts and a trade script.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod config;
mod curve;
mod quote;
mod simulate;
mod units;

use config::Config;

#[derive(Parser)]
#[command(name = "curvepool")]
#[command(about = "Curvepool CLI - quote and simulate a flat-then-curve token pool", long_about = None)]
#[command(version)]
struct Cli {
    /// Pool configuration file
    #[arg(short, long, default_value = "curvepool.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show pool parameters and state
    Info {
        /// Timestamp used for the sell window
        #[arg(long, default_value = "0")]
        now: u64,
    },

    /// Quote a trade without executing it
    Quote {
        #[command(subcommand)]
        command: QuoteCommands,
    },

    /// Run the [[trades]] script from the config file
    Simulate {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate the raw curve formulas at a point
    Curve {
        /// Reserve balance
        #[arg(long)]
        reserve: String,

        /// Token supply
        #[arg(long)]
        supply: String,

        /// Reserve ratio (parts per million)
        #[arg(long, default_value = "100000")]
        crr: u32,

        /// Reserve to deposit
        #[arg(long)]
        buy: Option<String>,

        /// Tokens to burn
        #[arg(long)]
        sell: Option<String>,
    },
}

#[derive(Subcommand)]
enum QuoteCommands {
    /// Tokens received for a reserve payment (fee included)
    Buy {
        /// Reserve amount
        amount: String,
    },
    /// Reserve received for selling tokens
    Sell {
        /// Token amount
        amount: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if cli.verbose {
        println!("{} {}", "Config:".bright_cyan(), cli.config.display());
    }

    match cli.command {
        Commands::Info { now } => {
            let market = Config::load(&cli.config)?.open_market()?;
            quote::show_info(&market, now)?;
        }
        Commands::Quote { command } => {
            let market = Config::load(&cli.config)?.open_market()?;
            match command {
                QuoteCommands::Buy { amount } => quote::quote_buy(&market, &amount)?,
                QuoteCommands::Sell { amount } => quote::quote_sell(&market, &amount)?,
            }
        }
        Commands::Simulate { json } => {
            let config = Config::load(&cli.config)?;
            let mut market = config.open_market()?;
            let report = simulate::run(&mut market, &config.trades)?;
            simulate::print_report(&report, json)?;
        }
        Commands::Curve {
            reserve,
            supply,
            crr,
            buy,
            sell,
        } => {
            curve::run(&reserve, &supply, crr, buy.as_deref(), sell.as_deref())?;
        }
    }

    Ok(())
}
