//! Structure confirmation — close-based break of the most recent opposing
//! swing after a sweep.

use serde::{Deserialize, Serialize};

use crate::domain::{BarSeries, Direction, StructureKind};

use super::swing::{SwingKind, SwingPoint};

/// Bars before the sweep still considered part of the active structure.
const STRUCTURE_WINDOW: usize = 30;

/// A confirmed break of structure following a sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    pub kind: StructureKind,
    pub direction: Direction,
    pub break_bar: usize,
    pub broken_level: f64,
    /// Close distance past the level in ATR units, capped at 1.
    pub strength: f64,
}

/// Scan bars after the sweep for the first close past the most recent
/// opposing swing level.
///
/// A bullish sweep is confirmed by a close above the most recent swing
/// high; bearish by a close below the most recent swing low. Only the
/// candle body counts: a wick through the level confirms nothing. The
/// break reads as a reversal when the broken level sits inside prior
/// structure (a lower high or higher low), as a continuation otherwise.
pub fn confirm_structure(
    series: &BarSeries,
    swings: &[SwingPoint],
    sweep_bar: usize,
    sweep_direction: Direction,
    current: usize,
) -> Option<Structure> {
    if current <= sweep_bar {
        return None;
    }
    let oldest = sweep_bar.saturating_sub(STRUCTURE_WINDOW);
    let opposing = match sweep_direction {
        Direction::Bullish => SwingKind::High,
        Direction::Bearish => SwingKind::Low,
    };
    let candidates: Vec<&SwingPoint> = swings
        .iter()
        .filter(|s| s.kind == opposing && s.index >= oldest && s.index < current)
        .collect();
    let broken = candidates.iter().max_by_key(|s| s.index)?;

    for i in sweep_bar + 1..=current {
        let close = series[i].close;
        let breaks = match sweep_direction {
            Direction::Bullish => close > broken.price,
            Direction::Bearish => close < broken.price,
        };
        if !breaks {
            continue;
        }
        let prior = candidates.iter().filter(|s| s.index < broken.index);
        let is_reversal = match sweep_direction {
            // breaking a lower high: prior structure printed a higher high
            Direction::Bullish => prior
                .map(|s| s.price)
                .fold(None::<f64>, |acc, p| Some(acc.map_or(p, |m| m.max(p))))
                .is_some_and(|max_prior| broken.price < max_prior),
            // breaking a higher low: prior structure printed a lower low
            Direction::Bearish => prior
                .map(|s| s.price)
                .fold(None::<f64>, |acc, p| Some(acc.map_or(p, |m| m.min(p))))
                .is_some_and(|min_prior| broken.price > min_prior),
        };
        let strength = ((close - broken.price).abs() / series.atr_at(i)).min(1.0);
        return Some(Structure {
            kind: if is_reversal {
                StructureKind::Reversal
            } else {
                StructureKind::Continuation
            },
            direction: sweep_direction,
            break_bar: i,
            broken_level: broken.price,
            strength,
        });
    }
    None
}
