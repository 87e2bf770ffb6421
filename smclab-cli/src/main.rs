//! SMCLab CLI — backtest, walk-forward, and monte-carlo commands.
//!
//! Commands:
//! - `backtest` — run the strategy over a CSV bar file and print the report
//! - `walk-forward` — split the series into train/test cycles and print the
//!   out-of-sample verdict
//! - `monte-carlo` — resample the backtest's trade order and print the
//!   distribution bands

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use smclab_runner::{
    load_bars_csv, render_backtest_report, render_monte_carlo_report, render_run_header,
    render_walk_forward_report, run_backtest, run_monte_carlo, run_walk_forward, BacktestResults,
    FilterVerdict, LoadedBars, RunConfig,
};

#[derive(Parser)]
#[command(name = "smclab", about = "Smart-money concepts backtesting lab")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest over a CSV bar file and print the report.
    Backtest {
        /// Path to the bar CSV (time,open,high,low,close,volume[,atr]).
        #[arg(long)]
        bars: PathBuf,

        /// Path to a TOML run config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run walk-forward validation and print the per-cycle verdict.
    WalkForward {
        #[arg(long)]
        bars: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Resample trade order under a fixed seed and print distribution bands.
    MonteCarlo {
        #[arg(long)]
        bars: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured iteration count.
        #[arg(long)]
        iterations: Option<usize>,

        /// Override the configured master seed.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Backtest { bars, config } => cmd_backtest(&bars, config.as_deref()),
        Commands::WalkForward { bars, config } => cmd_walk_forward(&bars, config.as_deref()),
        Commands::MonteCarlo {
            bars,
            config,
            iterations,
            seed,
        } => cmd_monte_carlo(&bars, config.as_deref(), iterations, seed),
    }
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(p) => RunConfig::from_toml_file(p)
            .with_context(|| format!("loading config {}", p.display())),
        None => Ok(RunConfig::default()),
    }
}

fn load_bars(bars: &Path) -> Result<LoadedBars> {
    load_bars_csv(bars).with_context(|| format!("loading bars {}", bars.display()))
}

fn run_configured_backtest(loaded: &LoadedBars, config: &RunConfig) -> Result<BacktestResults> {
    run_backtest(
        &config.strategy,
        &config.broker,
        &config.risk,
        &config.sim,
        &config.backtest,
        &config.symbol,
        &config.timeframe,
        &loaded.series,
        &FilterVerdict::default(),
    )
    .context("running backtest")
}

fn cmd_backtest(bars: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let loaded = load_bars(bars)?;
    let results = run_configured_backtest(&loaded, &config)?;
    print!("{}", render_run_header(&config.run_id(), &loaded.dataset_hash));
    print!(
        "{}",
        render_backtest_report(
            &results,
            &config.walk_forward.gates,
            &config.symbol,
            &config.timeframe,
        )
    );
    Ok(())
}

fn cmd_walk_forward(bars: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let loaded = load_bars(bars)?;
    let report = run_walk_forward(
        &config.strategy,
        &config.broker,
        &config.risk,
        &config.sim,
        &config.backtest,
        &config.walk_forward,
        &config.symbol,
        &config.timeframe,
        &loaded.series,
    )
    .context("running walk-forward validation")?;
    print!("{}", render_run_header(&config.run_id(), &loaded.dataset_hash));
    print!("{}", render_walk_forward_report(&report));
    Ok(())
}

fn cmd_monte_carlo(
    bars: &Path,
    config_path: Option<&Path>,
    iterations: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(n) = iterations {
        config.monte_carlo.iterations = n;
    }
    if let Some(s) = seed {
        config.monte_carlo.seed = s;
    }

    // The resampler permutes realized trades, so run the backtest first.
    let loaded = load_bars(bars)?;
    let results = run_configured_backtest(&loaded, &config)?;
    let r_values: Vec<f64> = results.trades.iter().map(|t| t.pnl_r).collect();
    let report = run_monte_carlo(&r_values, &config.monte_carlo)
        .context("running monte carlo resampling")?;
    print!("{}", render_run_header(&config.run_id(), &loaded.dataset_hash));
    print!("{}", render_monte_carlo_report(&report));
    Ok(())
}
