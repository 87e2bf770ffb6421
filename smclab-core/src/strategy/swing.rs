//! Swing detection — pivot highs/lows and equal-high/equal-low clusters.

use serde::{Deserialize, Serialize};

use crate::domain::BarSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingKind {
    High,
    Low,
}

/// A confirmed pivot. `cluster_size` counts this swing plus any later swings
/// of the same kind within the cluster tolerance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
    pub kind: SwingKind,
    pub is_cluster: bool,
    pub cluster_size: usize,
}

/// Detect pivot highs/lows over `bars[..=upto]`.
///
/// A pivot high at `i` must be >= the `lookback` highs to its left and
/// strictly > the `lookback` highs to its right; lows mirror that. The
/// strict right side breaks ties toward the earlier bar, so a flat-topped
/// double high yields exactly one swing. Pivots need `lookback` confirming
/// bars on the right, so the last `lookback` visible bars never qualify.
pub fn detect_swings(series: &BarSeries, lookback: usize, upto: usize) -> Vec<SwingPoint> {
    let bars = series.bars();
    let upto = upto.min(bars.len() - 1);
    let mut swings = Vec::new();
    if upto + 1 < 2 * lookback + 1 {
        return swings;
    }
    for i in lookback..=(upto - lookback) {
        let high = bars[i].high;
        let high_left = (1..=lookback).all(|j| high >= bars[i - j].high);
        let high_right = (1..=lookback).all(|j| high > bars[i + j].high);
        if high_left && high_right {
            swings.push(SwingPoint {
                index: i,
                price: high,
                kind: SwingKind::High,
                is_cluster: false,
                cluster_size: 1,
            });
        }

        let low = bars[i].low;
        let low_left = (1..=lookback).all(|j| low <= bars[i - j].low);
        let low_right = (1..=lookback).all(|j| low < bars[i + j].low);
        if low_left && low_right {
            swings.push(SwingPoint {
                index: i,
                price: low,
                kind: SwingKind::Low,
                is_cluster: false,
                cluster_size: 1,
            });
        }
    }
    swings
}

/// Mark equal-high/equal-low clusters in place.
///
/// For each swing, scan up to the next 5 swings of the same kind; if any sit
/// within `tolerance`, the swing and its matches all become clustered with
/// the group size. Overlapping groups keep the larger size.
pub fn mark_clusters(swings: &mut [SwingPoint], tolerance: f64) {
    let highs: Vec<usize> = positions_of(swings, SwingKind::High);
    let lows: Vec<usize> = positions_of(swings, SwingKind::Low);
    mark_kind(swings, &highs, tolerance);
    mark_kind(swings, &lows, tolerance);
}

fn positions_of(swings: &[SwingPoint], kind: SwingKind) -> Vec<usize> {
    swings
        .iter()
        .enumerate()
        .filter(|(_, s)| s.kind == kind)
        .map(|(i, _)| i)
        .collect()
}

fn mark_kind(swings: &mut [SwingPoint], positions: &[usize], tolerance: f64) {
    for (rank, &pos) in positions.iter().enumerate() {
        let base = swings[pos].price;
        let window_end = (rank + 5).min(positions.len());
        let matches: Vec<usize> = positions[rank + 1..window_end]
            .iter()
            .copied()
            .filter(|&p| (swings[p].price - base).abs() <= tolerance)
            .collect();
        if matches.is_empty() {
            continue;
        }
        let size = 1 + matches.len();
        for &p in std::iter::once(&pos).chain(matches.iter()) {
            swings[p].is_cluster = true;
            swings[p].cluster_size = swings[p].cluster_size.max(size);
        }
    }
}
