//! Trade simulator — path-dependent execution of the partial-exit plan.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, BarSeries, ExitReason, Side, Signal, TradeRecord};

use super::broker::BrokerConfig;

/// Time-stop horizon expressed in wall-clock minutes over the bar
/// timeframe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub time_stop_minutes: u32,
    pub timeframe_minutes: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time_stop_minutes: 60,
            timeframe_minutes: 15,
        }
    }
}

impl SimConfig {
    /// Bars a trade may stay open before the time stop fires.
    pub fn horizon_bars(&self) -> usize {
        (self.time_stop_minutes / self.timeframe_minutes.max(1)) as usize
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("signal bar {signal_bar} outside series of {len} bars")]
    SignalBarOutOfRange { signal_bar: usize, len: usize },
    #[error("signal has zero stop distance")]
    ZeroStopDistance,
}

/// Position lifecycle. Exits collapse the trade to a terminal
/// [`TradeRecord`]; the states only track which tranches remain open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TradeState {
    /// Full size on, initial stop active.
    OpenFull,
    /// Half booked at target 1, stop at breakeven.
    PartialAtTp1,
    /// 30% more booked at target 2, runner tranche left.
    PartialAtTp2,
}

impl TradeState {
    fn remaining_fraction(&self) -> f64 {
        match self {
            TradeState::OpenFull => 1.0,
            TradeState::PartialAtTp1 => 0.5,
            TradeState::PartialAtTp2 => 0.2,
        }
    }
}

/// Replays a signal against the bars that follow it.
///
/// Within each bar, transitions are checked in fixed priority: target 3,
/// then target 2, then target 1, then the stop. A single wide bar can
/// therefore fill target 1 and still stop out at breakeven before the
/// bar closes.
#[derive(Debug)]
pub struct TradeSimulator<'a> {
    broker: &'a BrokerConfig,
    sim: &'a SimConfig,
}

impl<'a> TradeSimulator<'a> {
    pub fn new(broker: &'a BrokerConfig, sim: &'a SimConfig) -> Self {
        Self { broker, sim }
    }

    /// Walk the trade bar by bar until an exit fires or the horizon runs
    /// out. `risk_pct` converts R into dollars: one R is
    /// `balance * risk_pct / 100`.
    pub fn simulate(
        &self,
        signal: &Signal,
        series: &BarSeries,
        balance: f64,
        risk_pct: f64,
    ) -> Result<TradeRecord, SimError> {
        if signal.signal_bar >= series.len() {
            return Err(SimError::SignalBarOutOfRange {
                signal_bar: signal.signal_bar,
                len: series.len(),
            });
        }
        let side = signal.side;
        let entry = self.broker.apply_entry(signal.entry, side);
        // uncosted stop distance defines 1R for pnl; the costed entry
        // anchors excursion tracking
        let r_price = signal.stop_distance();
        if r_price <= 0.0 {
            return Err(SimError::ZeroStopDistance);
        }

        let mut state = TradeState::OpenFull;
        let mut realized_r = 0.0;
        let mut breakeven_armed = false;
        let mut current_stop = signal.stop;
        let mut mae_r = 0.0_f64;
        let mut mfe_r = 0.0_f64;

        let horizon = self.sim.horizon_bars();
        let last_bar = (signal.signal_bar + horizon).min(series.len() - 1);

        for i in signal.signal_bar + 1..=last_bar {
            let bar = &series[i];
            let (adverse, favorable) = excursions(bar, side, entry, r_price);
            mae_r = mae_r.min(adverse);
            mfe_r = mfe_r.max(favorable);

            // 1. runner target: clears whatever tranche is still open
            if let Some(tp3) = signal.target_3 {
                if reaches(bar, side, tp3) {
                    let exit = self.broker.apply_exit(tp3, side);
                    let pnl_r =
                        realized_r + state.remaining_fraction() * signed_r(exit, entry, side, r_price);
                    return Ok(self.finish(
                        signal, series, i, entry, exit, pnl_r, ExitReason::Tp3Hit, mae_r, mfe_r,
                        balance, risk_pct,
                    ));
                }
            }

            // 2. target 2: partial when a runner remains, full exit otherwise
            if state == TradeState::PartialAtTp1 && reaches(bar, side, signal.target_2) {
                if signal.target_3.is_some() {
                    realized_r += 0.3 * 2.0;
                    state = TradeState::PartialAtTp2;
                } else {
                    let exit = self.broker.apply_exit(signal.target_2, side);
                    let pnl_r = realized_r + 0.5 * signed_r(exit, entry, side, r_price);
                    return Ok(self.finish(
                        signal, series, i, entry, exit, pnl_r, ExitReason::Tp2Hit, mae_r, mfe_r,
                        balance, risk_pct,
                    ));
                }
            }

            // 3. target 1: book half, stop moves to entry
            if state == TradeState::OpenFull && reaches(bar, side, signal.target_1) {
                realized_r += 0.5 * 1.0;
                state = TradeState::PartialAtTp1;
                breakeven_armed = true;
                current_stop = signal.entry;
            }

            // 4. stop, at its current level
            if stopped(bar, side, current_stop) {
                let exit = self.broker.apply_exit(current_stop, side);
                let (pnl_r, reason) = if breakeven_armed {
                    // half banked a flat 1R at target 1, the rest exits
                    // at entry for nothing
                    (0.5, ExitReason::BreakevenStop)
                } else {
                    (signed_r(exit, entry, side, r_price), ExitReason::StopLoss)
                };
                return Ok(self.finish(
                    signal, series, i, entry, exit, pnl_r, reason, mae_r, mfe_r, balance, risk_pct,
                ));
            }
        }

        // horizon exhausted: flatten at the close of the last bar in range
        let exit = self.broker.apply_exit(series[last_bar].close, side);
        let pnl_r = realized_r + state.remaining_fraction() * signed_r(exit, entry, side, r_price);
        Ok(self.finish(
            signal,
            series,
            last_bar,
            entry,
            exit,
            pnl_r,
            ExitReason::TimeStop,
            mae_r,
            mfe_r,
            balance,
            risk_pct,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        signal: &Signal,
        series: &BarSeries,
        exit_bar: usize,
        entry_price: f64,
        exit_price: f64,
        pnl_r: f64,
        exit_reason: ExitReason,
        mae_r: f64,
        mfe_r: f64,
        balance: f64,
        risk_pct: f64,
    ) -> TradeRecord {
        let dollars_per_r = balance * risk_pct / 100.0;
        let pnl_dollars = pnl_r * dollars_per_r - self.broker.round_trip_commission(signal.lots);
        TradeRecord {
            symbol: signal.symbol.clone(),
            side: signal.side,
            entry_time: series[signal.signal_bar].time,
            exit_time: series[exit_bar].time,
            entry_price,
            exit_price,
            initial_stop: signal.stop,
            lots: signal.lots,
            pnl_dollars,
            pnl_r,
            exit_reason,
            confidence: signal.confidence,
            mae_r,
            mfe_r,
            entry_bar: signal.signal_bar,
            exit_bar,
            provenance: signal.provenance.clone(),
        }
    }
}

fn excursions(bar: &Bar, side: Side, entry: f64, r_price: f64) -> (f64, f64) {
    match side {
        Side::Long => ((bar.low - entry) / r_price, (bar.high - entry) / r_price),
        Side::Short => ((entry - bar.high) / r_price, (entry - bar.low) / r_price),
    }
}

fn reaches(bar: &Bar, side: Side, level: f64) -> bool {
    match side {
        Side::Long => bar.high >= level,
        Side::Short => bar.low <= level,
    }
}

fn stopped(bar: &Bar, side: Side, stop: f64) -> bool {
    match side {
        Side::Long => bar.low <= stop,
        Side::Short => bar.high >= stop,
    }
}

fn signed_r(exit: f64, entry: f64, side: Side, r_price: f64) -> f64 {
    match side {
        Side::Long => (exit - entry) / r_price,
        Side::Short => (entry - exit) / r_price,
    }
}
