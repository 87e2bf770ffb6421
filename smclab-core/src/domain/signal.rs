//! Signal — the fully-specified trade proposal the detection pipeline emits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trade direction for an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short. Lets price arithmetic stay branch-free.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

/// Directional reading of a detected pattern. Bullish patterns propose
/// long entries, bearish patterns short entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    pub fn side(&self) -> Side {
        match self {
            Direction::Bullish => Side::Long,
            Direction::Bearish => Side::Short,
        }
    }

    pub fn bias(&self) -> Bias {
        match self {
            Direction::Bullish => Bias::Bullish,
            Direction::Bearish => Bias::Bearish,
        }
    }
}

/// Directional lean of a higher timeframe, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

/// What kind of liquidity the sweep took out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SweepKind {
    /// A single swing level.
    #[default]
    Single,
    /// A cluster of roughly-equal highs.
    EqualHighs,
    /// A cluster of roughly-equal lows.
    EqualLows,
}

/// How the structure break reads against prior structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StructureKind {
    /// Break of structure: continuation with the prevailing direction.
    #[default]
    Continuation,
    /// Market structure shift: the break reverses prior structure.
    Reversal,
}

/// Where the proposed entry sits inside the recent swing envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RangePosition {
    Premium,
    Discount,
    #[default]
    Neutral,
}

/// One step of the partial-exit plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialExit {
    pub level: f64,
    /// Fraction of the original position closed at this level.
    pub close_fraction: f64,
    pub move_stop_to_breakeven: bool,
    pub trail: bool,
}

/// Which detections produced a signal. Carried through to the trade record
/// so post-hoc analysis can slice results by setup shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Provenance {
    pub sweep_kind: SweepKind,
    pub sweep_bar: usize,
    pub swept_price: f64,
    pub cluster_size: usize,
    pub structure_kind: StructureKind,
    pub structure_bar: usize,
    pub order_block: bool,
    /// Origin bar of the zone confluent with the entry imbalance, if any.
    pub zone_origin: Option<usize>,
    pub range_position: RangePosition,
    pub htf_aligned: bool,
    pub itf_aligned: bool,
}

/// A fully-specified trade proposal: direction, levels, sizing, and the
/// partial-exit plan the simulator executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub timeframe: String,
    pub side: Side,
    pub entry: f64,
    pub stop: f64,
    pub target_1: f64,
    pub target_2: f64,
    /// Liquidity-based runner target; only set when far enough to be worth
    /// holding a runner for.
    pub target_3: Option<f64>,
    /// Confluence score in [0, 1].
    pub confidence: f64,
    /// Risk committed to this trade in R units (1.0 = one full unit).
    pub risk_r: f64,
    pub lots: f64,
    pub partial_plan: Vec<PartialExit>,
    pub provenance: Provenance,
    /// Index of the bar the signal was generated on.
    pub signal_bar: usize,
    pub posted_at: DateTime<Utc>,
}

impl Signal {
    /// Distance from entry to stop, the definition of 1R in price terms.
    pub fn stop_distance(&self) -> f64 {
        (self.entry - self.stop).abs()
    }
}
