//! Walk-forward validation — non-overlapping train/test cycles with
//! out-of-sample gates.
//!
//! The series is cut into consecutive cycles of `train_months` followed
//! by `test_months`, converted to bar counts from the timeframe. Signals
//! are regenerated on each cycle's test window with a fresh risk manager,
//! so no state leaks between cycles. A cycle passes when it clears all
//! three gates; the strategy is approved when at least two cycles pass.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use smclab_core::domain::BarSeries;
use smclab_core::risk::RiskConfig;
use smclab_core::sim::{BrokerConfig, SimConfig};
use smclab_core::strategy::StrategyConfig;

use crate::runner::{run_backtest, BacktestConfig, FilterVerdict, RunError};

/// Out-of-sample acceptance thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationGates {
    pub min_profit_factor: f64,
    pub min_win_rate: f64,
    /// Deepest tolerated equity drawdown, as a fraction.
    pub max_drawdown_pct: f64,
}

impl Default for ValidationGates {
    fn default() -> Self {
        Self {
            min_profit_factor: 1.30,
            min_win_rate: 0.40,
            max_drawdown_pct: 0.12,
        }
    }
}

/// Configuration for walk-forward validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    pub train_months: usize,
    pub test_months: usize,
    pub cycles: usize,
    /// Minutes per bar, used to convert months to bar counts.
    pub timeframe_minutes: usize,
    pub gates: ValidationGates,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            train_months: 6,
            test_months: 2,
            cycles: 3,
            timeframe_minutes: 15,
            gates: ValidationGates::default(),
        }
    }
}

impl WalkForwardConfig {
    /// Bars per 30-day month at this timeframe.
    pub fn bars_per_month(&self) -> usize {
        (30 * 24 * 60) / self.timeframe_minutes.max(1)
    }
}

/// One cycle's out-of-sample outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub cycle: usize,
    /// Bar range of the test window in the full series, end exclusive.
    pub test_start: usize,
    pub test_end: usize,
    pub trades: usize,
    pub profit_factor: f64,
    pub win_rate: f64,
    pub max_drawdown_pct: f64,
    pub total_pnl_r: f64,
    pub passed: bool,
}

/// Aggregate walk-forward verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardReport {
    pub cycles: Vec<CycleOutcome>,
    pub passed: usize,
    pub total: usize,
    pub pass_rate: f64,
    /// At least two cycles cleared every gate.
    pub approved: bool,
}

#[derive(Debug, Error)]
pub enum WalkForwardError {
    #[error("insufficient data: {total_bars} bars, {needed} needed for {cycles} cycles")]
    InsufficientData {
        total_bars: usize,
        needed: usize,
        cycles: usize,
    },
    #[error("backtest failed on cycle {cycle}: {source}")]
    CycleFailed {
        cycle: usize,
        #[source]
        source: RunError,
    },
}

/// Run walk-forward validation over the full series.
///
/// Cycles are evaluated in parallel; each gets its own engine and risk
/// manager via `run_backtest`.
#[allow(clippy::too_many_arguments)]
pub fn run_walk_forward(
    strategy: &StrategyConfig,
    broker: &BrokerConfig,
    risk: &RiskConfig,
    sim: &SimConfig,
    backtest: &BacktestConfig,
    wf: &WalkForwardConfig,
    symbol: &str,
    timeframe: &str,
    series: &BarSeries,
) -> Result<WalkForwardReport, WalkForwardError> {
    let bars_per_month = wf.bars_per_month();
    let train_bars = wf.train_months * bars_per_month;
    let test_bars = wf.test_months * bars_per_month;
    let cycle_bars = train_bars + test_bars;
    let needed = wf.cycles * cycle_bars;
    if series.len() < needed {
        return Err(WalkForwardError::InsufficientData {
            total_bars: series.len(),
            needed,
            cycles: wf.cycles,
        });
    }

    let outcomes: Result<Vec<CycleOutcome>, WalkForwardError> = (0..wf.cycles)
        .into_par_iter()
        .map(|cycle| {
            let test_start = cycle * cycle_bars + train_bars;
            let test_end = test_start + test_bars;
            // The test window becomes its own series; warmup inside the
            // window keeps signal generation causal at its left edge.
            let window = series.window(test_start, test_end);
            let results = run_backtest(
                strategy,
                broker,
                risk,
                sim,
                backtest,
                symbol,
                timeframe,
                &window,
                &FilterVerdict::default(),
            )
            .map_err(|source| WalkForwardError::CycleFailed { cycle, source })?;

            let passed = !results.trades.is_empty()
                && results.profit_factor >= wf.gates.min_profit_factor
                && results.win_rate >= wf.gates.min_win_rate
                && results.max_drawdown_pct <= wf.gates.max_drawdown_pct;
            Ok(CycleOutcome {
                cycle,
                test_start,
                test_end,
                trades: results.total_trades,
                profit_factor: results.profit_factor,
                win_rate: results.win_rate,
                max_drawdown_pct: results.max_drawdown_pct,
                total_pnl_r: results.total_pnl_r,
                passed,
            })
        })
        .collect();
    let mut cycles = outcomes?;
    cycles.sort_by_key(|c| c.cycle);

    let passed = cycles.iter().filter(|c| c.passed).count();
    let total = cycles.len();
    Ok(WalkForwardReport {
        passed,
        total,
        pass_rate: if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64
        },
        approved: passed >= 2,
        cycles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use smclab_core::domain::Bar;

    fn flat_series(n: usize, minutes_per_bar: i64) -> BarSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap();
        let bars: Vec<Bar> = (0..n)
            .map(|i| {
                let close = 100.0 + (i % 3) as f64 * 0.1;
                Bar {
                    time: base + Duration::minutes(minutes_per_bar * i as i64),
                    open: close - 0.05,
                    high: close + 0.2,
                    low: close - 0.2,
                    close,
                    volume: 1000.0,
                    atr: Some(1.0),
                }
            })
            .collect();
        BarSeries::new(bars).unwrap()
    }

    /// One bar per "month" keeps the fixture small: 43200 minutes.
    fn fast_wf(cycles: usize) -> WalkForwardConfig {
        WalkForwardConfig {
            train_months: 6,
            test_months: 2,
            cycles,
            timeframe_minutes: 43_200,
            gates: ValidationGates::default(),
        }
    }

    #[test]
    fn bars_per_month_at_m15() {
        let wf = WalkForwardConfig::default();
        assert_eq!(wf.bars_per_month(), 2880);
    }

    #[test]
    fn insufficient_data_is_an_error() {
        let wf = fast_wf(3); // needs 24 bars
        let series = flat_series(20, 43_200);
        let err = run_walk_forward(
            &StrategyConfig::default(),
            &BrokerConfig::frictionless(),
            &RiskConfig::default(),
            &SimConfig::default(),
            &BacktestConfig::default(),
            &wf,
            "XAUUSD",
            "MN",
            &series,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WalkForwardError::InsufficientData { needed: 24, .. }
        ));
    }

    #[test]
    fn cycles_cover_disjoint_test_windows() {
        let wf = fast_wf(3);
        let backtest = BacktestConfig {
            warmup_bars: 0,
            ..Default::default()
        };
        let series = flat_series(24, 43_200);
        let report = run_walk_forward(
            &StrategyConfig::default(),
            &BrokerConfig::frictionless(),
            &RiskConfig::default(),
            &SimConfig::default(),
            &backtest,
            &wf,
            "XAUUSD",
            "MN",
            &series,
        )
        .unwrap();
        assert_eq!(report.total, 3);
        let ranges: Vec<(usize, usize)> = report
            .cycles
            .iter()
            .map(|c| (c.test_start, c.test_end))
            .collect();
        assert_eq!(ranges, vec![(6, 8), (14, 16), (22, 24)]);
        // Flat chop trades nothing, so no cycle can pass the gates.
        assert_eq!(report.passed, 0);
        assert!(!report.approved);
    }

    #[test]
    fn approval_needs_two_passing_cycles() {
        let outcome = |cycle: usize, passed: bool| CycleOutcome {
            cycle,
            test_start: 0,
            test_end: 0,
            trades: 10,
            profit_factor: if passed { 2.0 } else { 0.5 },
            win_rate: 0.5,
            max_drawdown_pct: 0.05,
            total_pnl_r: 0.0,
            passed,
        };
        let report = |flags: [bool; 3]| {
            let cycles: Vec<CycleOutcome> = flags
                .iter()
                .enumerate()
                .map(|(i, &p)| outcome(i, p))
                .collect();
            let passed = cycles.iter().filter(|c| c.passed).count();
            WalkForwardReport {
                passed,
                total: 3,
                pass_rate: passed as f64 / 3.0,
                approved: passed >= 2,
                cycles,
            }
        };
        assert!(!report([true, false, false]).approved);
        assert!(report([true, false, true]).approved);
        assert!(report([true, true, true]).approved);
    }
}
