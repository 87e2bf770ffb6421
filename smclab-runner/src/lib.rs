//! SMCLab Runner — backtest orchestration, validation, and reporting.
//!
//! This crate builds on `smclab-core` to provide:
//! - CSV bar loading with automatic ATR backfill
//! - Full-series backtest runner wired through the risk manager
//! - Performance metrics and the text report printer
//! - Walk-forward validation with out-of-sample gates
//! - Seeded Monte Carlo trade-order resampling

pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod monte_carlo;
pub mod report;
pub mod runner;
pub mod walk_forward;

pub use config::{ConfigFileError, RunConfig};
pub use data_loader::{load_bars_csv, LoadError, LoadedBars};
pub use metrics::BacktestResults;
pub use monte_carlo::{run_monte_carlo, MonteCarloConfig, MonteCarloError, MonteCarloReport};
pub use report::{
    render_backtest_report, render_monte_carlo_report, render_run_header,
    render_walk_forward_report,
};
pub use runner::{run_backtest, BacktestConfig, FilterVerdict, RunError};
pub use walk_forward::{
    run_walk_forward, ValidationGates, WalkForwardConfig, WalkForwardError, WalkForwardReport,
};
