//! TradeRecord — the immutable outcome of one simulated trade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signal::{Provenance, Side};

/// Why a trade left the market.
///
/// Target 1 never terminates a trade on its own: it closes half and arms the
/// breakeven stop, so the terminal reasons start at target 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    Tp2Hit,
    Tp3Hit,
    StopLoss,
    BreakevenStop,
    TimeStop,
}

/// One completed trade with R-multiple accounting and excursion tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub side: Side,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub initial_stop: f64,
    pub lots: f64,
    pub pnl_dollars: f64,
    /// Blended R multiple across all partial closes.
    pub pnl_r: f64,
    pub exit_reason: ExitReason,
    pub confidence: f64,
    /// Worst adverse excursion while open, in R. Zero or negative.
    pub mae_r: f64,
    /// Best favorable excursion while open, in R. Zero or positive.
    pub mfe_r: f64,
    pub entry_bar: usize,
    pub exit_bar: usize,
    pub provenance: Provenance,
}

impl TradeRecord {
    /// Strictly positive R counts as a win; breakeven is not a win.
    pub fn is_winner(&self) -> bool {
        self.pnl_r > 0.0
    }

    pub fn duration_hours(&self) -> f64 {
        (self.exit_time - self.entry_time).num_seconds() as f64 / 3600.0
    }
}
