//! Text report rendering for backtest, walk-forward, and Monte Carlo runs.

use crate::metrics::BacktestResults;
use crate::monte_carlo::{DistributionStats, MonteCarloReport};
use crate::walk_forward::{ValidationGates, WalkForwardReport};

fn short_hash(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}

/// Render the provenance line printed above every report: the config's
/// run id and the bar file's dataset hash, both abbreviated.
pub fn render_run_header(run_id: &str, dataset_hash: &str) -> String {
    format!(
        "run {}  dataset {}\n\n",
        short_hash(run_id),
        short_hash(dataset_hash),
    )
}

fn gate_mark(ok: bool) -> &'static str {
    if ok {
        "PASS"
    } else {
        "FAIL"
    }
}

/// Render the full backtest report, including the validation gates.
pub fn render_backtest_report(
    results: &BacktestResults,
    gates: &ValidationGates,
    symbol: &str,
    timeframe: &str,
) -> String {
    let mut out = format!(
        "=== Backtest Report: {symbol} {timeframe} ===\n\
         \n\
         Trades\n\
         \x20 total:               {}\n\
         \x20 winners / losers:    {} / {}\n\
         \x20 win rate:            {:.1}%\n\
         \x20 per month:           {:.1}\n\
         \x20 avg duration:        {:.1}h\n",
        results.total_trades,
        results.winning_trades,
        results.losing_trades,
        results.win_rate * 100.0,
        results.trades_per_month,
        results.avg_trade_duration_hours,
    );

    out.push_str(&format!(
        "\nPerformance\n\
         \x20 net pnl:             ${:+.2} ({:+.2}R)\n\
         \x20 expectancy:          {:+.3}R per trade\n\
         \x20 avg win / avg loss:  {:+.2}R / {:+.2}R (RR {:.2})\n\
         \x20 profit factor:       {:.2}\n\
         \x20 sharpe:              {:.2}\n",
        results.total_pnl_dollars,
        results.total_pnl_r,
        results.expectancy_r,
        results.avg_win_r,
        results.avg_loss_r,
        results.avg_rr,
        results.profit_factor,
        results.sharpe_ratio,
    ));

    out.push_str(&format!(
        "\nRisk\n\
         \x20 max drawdown:        {:.1}% equity, {:.2}R cumulative\n\
         \x20 worst losing streak: {}\n",
        results.max_drawdown_pct * 100.0,
        results.max_drawdown_r,
        results.max_consecutive_losses,
    ));

    if !results.monthly_returns.is_empty() {
        out.push_str("\nMonthly returns (R)\n");
        for (month, r) in &results.monthly_returns {
            out.push_str(&format!("  {month}:  {r:+.2}\n"));
        }
    }

    out.push_str(&format!(
        "\nValidation gates\n\
         \x20 profit factor >= {:.2}:  {}\n\
         \x20 win rate >= {:.0}%:       {}\n\
         \x20 drawdown <= {:.0}%:       {}\n",
        gates.min_profit_factor,
        gate_mark(results.profit_factor >= gates.min_profit_factor),
        gates.min_win_rate * 100.0,
        gate_mark(results.win_rate >= gates.min_win_rate),
        gates.max_drawdown_pct * 100.0,
        gate_mark(results.max_drawdown_pct <= gates.max_drawdown_pct),
    ));

    out
}

/// Render the per-cycle walk-forward table and verdict.
pub fn render_walk_forward_report(report: &WalkForwardReport) -> String {
    let mut out = String::from(
        "=== Walk-Forward Report ===\n\
         \n\
         cycle  bars            trades  pf     win%   dd%    pnl(R)  verdict\n",
    );
    for c in &report.cycles {
        out.push_str(&format!(
            "{:>5}  [{:>5}..{:<5})  {:>6}  {:>5.2}  {:>5.1}  {:>5.1}  {:>+6.2}  {}\n",
            c.cycle,
            c.test_start,
            c.test_end,
            c.trades,
            c.profit_factor,
            c.win_rate * 100.0,
            c.max_drawdown_pct * 100.0,
            c.total_pnl_r,
            gate_mark(c.passed),
        ));
    }
    out.push_str(&format!(
        "\n{} of {} cycles passed ({:.0}%)\nstrategy {}\n",
        report.passed,
        report.total,
        report.pass_rate * 100.0,
        if report.approved {
            "APPROVED (>= 2 passing cycles)"
        } else {
            "REJECTED (< 2 passing cycles)"
        },
    ));
    out
}

fn render_distribution(name: &str, stats: &DistributionStats) -> String {
    format!(
        "  {name:<14} mean {:+.2}  sd {:.2}  p5 {:+.2}  p50 {:+.2}  p95 {:+.2}\n",
        stats.mean, stats.std_dev, stats.p5, stats.p50, stats.p95,
    )
}

/// Render the Monte Carlo distribution bands.
pub fn render_monte_carlo_report(report: &MonteCarloReport) -> String {
    let mut out = format!(
        "=== Monte Carlo Report ({} iterations) ===\n\n",
        report.iterations
    );
    out.push_str(&render_distribution("terminal R", &report.terminal_r));
    out.push_str(&render_distribution("max dd (R)", &report.max_drawdown_r));
    out.push_str(&render_distribution("win rate", &report.win_rate));
    out.push_str(&render_distribution("profit factor", &report.profit_factor));
    out.push_str(&format!(
        "\nprobability of profit: {:.1}%\n",
        report.probability_of_profit * 100.0
    ));
    out
}
