//! Performance metrics — pure functions over trade lists and equity curves.
//!
//! Every metric is a pure function: trade list and/or equity curve in,
//! scalar out. No dependencies on the runner or the strategy engine, so
//! the Monte Carlo resampler can reuse the R-denominated functions on
//! shuffled copies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smclab_core::domain::TradeRecord;

/// Aggregate results for a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResults {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_pnl_dollars: f64,
    pub total_pnl_r: f64,
    pub avg_win_r: f64,
    pub avg_loss_r: f64,
    /// Average reward-to-risk: avg_win_r / |avg_loss_r|.
    pub avg_rr: f64,
    pub profit_factor: f64,
    /// Mean pnl_r per trade.
    pub expectancy_r: f64,
    /// Deepest peak-to-trough equity drop as a positive fraction.
    pub max_drawdown_pct: f64,
    /// Deepest drawdown of the cumulative R curve, in R (positive).
    pub max_drawdown_r: f64,
    pub max_consecutive_losses: usize,
    /// Annualized from per-trade R returns; 0 when variance is zero.
    pub sharpe_ratio: f64,
    pub avg_trade_duration_hours: f64,
    pub trades_per_month: f64,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<f64>,
    /// Realized R per calendar month of exit, keyed "YYYY-MM".
    pub monthly_returns: BTreeMap<String, f64>,
}

impl BacktestResults {
    /// Compute all metrics from a closed-trade list and the balance curve.
    ///
    /// The equity curve is balance-after-each-trade with the initial
    /// balance prepended. All fields are zero-safe for an empty run.
    pub fn compute(trades: Vec<TradeRecord>, equity_curve: Vec<f64>) -> Self {
        let r_values: Vec<f64> = trades.iter().map(|t| t.pnl_r).collect();
        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let losing_trades = trades.iter().filter(|t| t.pnl_r < 0.0).count();

        let wins: Vec<f64> = r_values.iter().copied().filter(|r| *r > 0.0).collect();
        let losses: Vec<f64> = r_values.iter().copied().filter(|r| *r < 0.0).collect();
        let avg_win_r = mean(&wins);
        let avg_loss_r = mean(&losses);
        let avg_rr = if avg_loss_r.abs() < 1e-12 {
            0.0
        } else {
            avg_win_r / avg_loss_r.abs()
        };

        Self {
            total_trades: trades.len(),
            winning_trades,
            losing_trades,
            win_rate: if trades.is_empty() {
                0.0
            } else {
                winning_trades as f64 / trades.len() as f64
            },
            total_pnl_dollars: trades.iter().map(|t| t.pnl_dollars).sum(),
            total_pnl_r: r_values.iter().sum(),
            avg_win_r,
            avg_loss_r,
            avg_rr,
            profit_factor: profit_factor_r(&r_values),
            expectancy_r: mean(&r_values),
            max_drawdown_pct: max_drawdown_pct(&equity_curve),
            max_drawdown_r: max_drawdown_r(&r_values),
            max_consecutive_losses: max_consecutive_losses(&trades),
            sharpe_ratio: sharpe_from_r(&r_values),
            avg_trade_duration_hours: avg_duration_hours(&trades),
            trades_per_month: trades_per_month(&trades),
            monthly_returns: monthly_returns(&trades),
            trades,
            equity_curve,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Profit factor in R terms: gross winning R / gross losing R.
///
/// A run with no losing trades has no meaningful factor and reports 0.
pub fn profit_factor_r(r_values: &[f64]) -> f64 {
    let gross_profit: f64 = r_values.iter().filter(|r| **r > 0.0).sum();
    let gross_loss: f64 = r_values.iter().filter(|r| **r < 0.0).map(|r| r.abs()).sum();
    if gross_loss < 1e-12 {
        return 0.0;
    }
    gross_profit / gross_loss
}

/// Deepest peak-to-trough drop of the cumulative R curve, in R.
pub fn max_drawdown_r(r_values: &[f64]) -> f64 {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for r in r_values {
        cumulative += r;
        if cumulative > peak {
            peak = cumulative;
        }
        let dd = peak - cumulative;
        if dd > max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// Deepest peak-to-trough equity drop as a positive fraction of the peak.
pub fn max_drawdown_pct(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (peak - eq) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Longest run of consecutive losing trades.
pub fn max_consecutive_losses(trades: &[TradeRecord]) -> usize {
    let mut longest = 0usize;
    let mut current = 0usize;
    for t in trades {
        if t.pnl_r < 0.0 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Annualized Sharpe ratio treating each trade's R as one period return.
///
/// Sharpe = mean(R) / std(R) * sqrt(252). Returns 0 when the sample is
/// too small or has zero variance.
pub fn sharpe_from_r(r_values: &[f64]) -> f64 {
    if r_values.len() < 2 {
        return 0.0;
    }
    let std = std_dev(r_values);
    if std < 1e-12 {
        return 0.0;
    }
    (mean(r_values) / std) * (252.0_f64).sqrt()
}

fn avg_duration_hours(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.duration_hours()).sum::<f64>() / trades.len() as f64
}

/// Trades per 30.44-day month, measured over the first-entry to
/// last-exit span. A single trade reports 0 (no measurable span).
pub fn trades_per_month(trades: &[TradeRecord]) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }
    let first = trades
        .iter()
        .map(|t| t.entry_time)
        .min()
        .unwrap_or_default();
    let last = trades.iter().map(|t| t.exit_time).max().unwrap_or_default();
    let span_days = (last - first).num_seconds() as f64 / 86_400.0;
    if span_days <= 0.0 {
        return 0.0;
    }
    trades.len() as f64 / (span_days / 30.44)
}

/// Realized R summed per calendar month of trade exit.
pub fn monthly_returns(trades: &[TradeRecord]) -> BTreeMap<String, f64> {
    let mut months: BTreeMap<String, f64> = BTreeMap::new();
    for t in trades {
        let key = t.exit_time.format("%Y-%m").to_string();
        *months.entry(key).or_insert(0.0) += t.pnl_r;
    }
    months
}

/// Percentile by linear interpolation over an already-sorted slice.
///
/// `p` is in [0, 100]. Empty input returns 0.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
