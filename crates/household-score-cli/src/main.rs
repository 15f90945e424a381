mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::Value;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::dashboard::SimulateArgs;
use commands::history::ImportArgs;
use commands::score::{AddArgs, ScoreArgs};
use commands::Context;

/// Household financial health scoring
#[derive(Parser)]
#[command(
    name = "hscore",
    version,
    about = "Household financial health scoring",
    long_about = "Scores households on savings, expenses, loans, credit card use and \
                  discretionary spending, keeps an append-only history spreadsheet, \
                  and answers what-if questions against it."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Scoring configuration override (JSON, or YAML by extension)
    #[arg(long, global = true)]
    config: Option<String>,

    /// History spreadsheet location
    #[arg(
        long,
        global = true,
        env = "HSCORE_HISTORY",
        default_value = "household_financial_scores.csv"
    )]
    history: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a batch of household transaction records
    Score(ScoreArgs),
    /// Score one record and append it to the history
    Add(AddArgs),
    /// Append an external table to the history
    Import(ImportArgs),
    /// Ratio view of the whole history
    View,
    /// Latest score per household
    Summary,
    /// What-if simulation for one household
    Simulate(SimulateArgs),
    /// Print the effective scoring configuration
    Config,
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

    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    let result = match cli.command {
        Commands::Version => {
            println!("hscore {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        command => Context::load(cli.config.as_deref(), &cli.history)
            .and_then(|ctx| dispatch(command, &ctx)),
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

fn dispatch(command: Commands, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    match command {
        Commands::Score(args) => commands::score::run_score(args, ctx),
        Commands::Add(args) => commands::score::run_add(args, ctx),
        Commands::Import(args) => commands::history::run_import(args, ctx),
        Commands::View => commands::dashboard::run_view(ctx),
        Commands::Summary => commands::dashboard::run_summary(ctx),
        Commands::Simulate(args) => commands::dashboard::run_simulate(args, ctx),
        Commands::Config => commands::run_config(ctx),
        Commands::Version => Ok(Value::String(format!("hscore {}", env!("CARGO_PKG_VERSION")))),
    }
}
