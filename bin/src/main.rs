//! dynafactor CLI binary.
//!
//! Runs the pipeline stages over flat CSV tables, one stage per subcommand
//! or all of them with `run`.
//!
//! Usage: `dynafactor [--config FILE] [--log-level LEVEL] <COMMAND>`

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dynafactor::Pipeline;
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "dynafactor")]
#[command(about = "Cross-sectional factor models for crypto asset panels", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML file overriding stage parameters
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute returns, the risk-free rate and the market benchmark
    Returns {
        /// Daily price panel (symbol, date, OHLC, volume, market_cap)
        #[arg(short, long)]
        input: PathBuf,

        /// Risk-free table (date, annualised percent rate)
        #[arg(short, long)]
        risk_free: PathBuf,

        /// Output panel
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Compute the rolling characteristics
    Features {
        /// Panel produced by `returns`
        #[arg(short, long)]
        input: PathBuf,

        /// Output panel
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Build the market and long-short factor returns
    Factors {
        /// Panel produced by `features`
        #[arg(short, long)]
        input: PathBuf,

        /// Output factor table (date, one column per factor)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Fit the nested static regressions
    Static {
        /// Panel produced by `features`
        #[arg(short, long)]
        input: PathBuf,

        /// Factor table produced by `factors`
        #[arg(short, long)]
        factors: PathBuf,

        /// Loadings of the full specification
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fit the characteristic-instrumented regression
    Dynamic {
        /// Panel produced by `features`
        #[arg(short, long)]
        input: PathBuf,

        /// Factor table produced by `factors`
        #[arg(short, long)]
        factors: PathBuf,

        /// Modelling panel with loadings and fitted returns
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Prepare the instrumented principal components panel
    IpcaPanel {
        /// Panel produced by `features`
        #[arg(short, long)]
        input: PathBuf,

        /// Output panel
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run every stage and write every intermediate table
    Run {
        /// Daily price panel
        #[arg(short, long)]
        input: PathBuf,

        /// Risk-free table
        #[arg(short, long)]
        risk_free: PathBuf,

        /// Directory receiving the outputs
        #[arg(short, long)]
        output_dir: PathBuf,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    let level = cli.log_level.unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let pipeline = Pipeline::new(config.pipeline);

    match cli.command {
        Commands::Returns { input, risk_free, output } => {
            commands::returns(&pipeline, &input, &risk_free, &output)
        }
        Commands::Features { input, output } => commands::features(&pipeline, &input, &output),
        Commands::Factors { input, output } => commands::factors(&pipeline, &input, &output),
        Commands::Static { input, factors, output } => {
            commands::static_models(&pipeline, &input, &factors, output.as_deref())
        }
        Commands::Dynamic { input, factors, output } => {
            commands::dynamic_model(&pipeline, &input, &factors, output.as_deref())
        }
        Commands::IpcaPanel { input, output } => commands::ipca_panel(&pipeline, &input, &output),
        Commands::Run { input, risk_free, output_dir } => {
            commands::run_all(&pipeline, &input, &risk_free, &output_dir)
        }
    }
}
