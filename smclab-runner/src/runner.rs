//! Backtest runner — walks a bar series, asks the engine for signals, and
//! settles each trade through the simulator and risk manager.
//!
//! The loop is sequential by construction: each simulated trade advances
//! the cursor past its exit bar, so at most one position is open per
//! symbol and the risk manager sees trades in execution order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use smclab_core::domain::{BarSeries, Bias};
use smclab_core::risk::{RiskConfig, RiskManager};
use smclab_core::sim::{BrokerConfig, SimConfig, SimError, TradeSimulator};
use smclab_core::strategy::{ConfigError, MarketContext, StrategyConfig, StrategyEngine};

use crate::metrics::BacktestResults;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("simulation error: {0}")]
    Sim(#[from] SimError),
    #[error("series of {len} bars is shorter than warmup {warmup}")]
    NotEnoughBars { len: usize, warmup: usize },
}

/// Backtest parameters independent of the strategy itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub initial_balance: f64,
    /// Percent of balance risked per trade before throttling.
    pub risk_pct: f64,
    /// Bars skipped before the first signal evaluation.
    pub warmup_bars: usize,
    pub htf_bias: Bias,
    pub itf_bias: Bias,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_balance: 10_000.0,
            risk_pct: 1.0,
            warmup_bars: 50,
            htf_bias: Bias::Neutral,
            itf_bias: Bias::Neutral,
        }
    }
}

/// Verdict of the external session/news/volatility gate.
///
/// The gate itself lives outside this crate; callers pass its decision
/// in. A blocked run produces an empty result rather than an error so
/// reports can show why nothing traded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterVerdict {
    pub allowed: bool,
    pub reasons: Vec<String>,
}

impl Default for FilterVerdict {
    fn default() -> Self {
        Self {
            allowed: true,
            reasons: Vec::new(),
        }
    }
}

/// Run a backtest over the whole series.
///
/// Walks bars from warmup to the end. At each bar the risk manager is
/// day-rolled if the calendar date changed, gated via `can_trade`, and
/// the engine is consulted. A produced signal is registered, simulated
/// to its exit, recorded, and the cursor jumps past the exit bar.
#[allow(clippy::too_many_arguments)]
pub fn run_backtest(
    strategy: &StrategyConfig,
    broker: &BrokerConfig,
    risk: &RiskConfig,
    sim: &SimConfig,
    backtest: &BacktestConfig,
    symbol: &str,
    timeframe: &str,
    series: &BarSeries,
    verdict: &FilterVerdict,
) -> Result<BacktestResults, RunError> {
    if series.len() <= backtest.warmup_bars {
        return Err(RunError::NotEnoughBars {
            len: series.len(),
            warmup: backtest.warmup_bars,
        });
    }
    if !verdict.allowed {
        return Ok(BacktestResults::compute(
            vec![],
            vec![backtest.initial_balance],
        ));
    }

    let engine = StrategyEngine::new(strategy.clone(), symbol, timeframe)?;
    let simulator = TradeSimulator::new(broker, sim);
    let mut risk_mgr = RiskManager::new(risk.clone());

    let mut balance = backtest.initial_balance;
    let mut equity_curve = vec![balance];
    let mut trades = Vec::new();
    let mut current_day = series[backtest.warmup_bars].time.date_naive();

    let mut i = backtest.warmup_bars;
    while i < series.len() {
        let day = series[i].time.date_naive();
        if day != current_day {
            risk_mgr.reset_daily();
            current_day = day;
        }

        if !risk_mgr.can_trade() {
            i += 1;
            continue;
        }

        let ctx = MarketContext {
            htf_bias: backtest.htf_bias,
            itf_bias: backtest.itf_bias,
            balance,
            risk_pct: risk_mgr.effective_risk_pct(backtest.risk_pct),
        };
        let Some(signal) = engine.generate_signal(series, i, &ctx) else {
            i += 1;
            continue;
        };

        let trade_id = format!("signal-{i}");
        risk_mgr.register_trade(&trade_id, risk_mgr.effective_risk_r(signal.risk_r));
        let record = simulator.simulate(&signal, series, balance, ctx.risk_pct)?;
        risk_mgr.unregister_trade(&trade_id);
        risk_mgr.record_result(record.pnl_dollars, record.pnl_r);

        balance += record.pnl_dollars;
        equity_curve.push(balance);
        i = record.exit_bar + 1;
        trades.push(record);
    }

    Ok(BacktestResults::compute(trades, equity_curve))
}
