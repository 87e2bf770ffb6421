//! Liquidity sweep detection — a stop hunt through a swing level that
//! recloses back inside the range.

use serde::{Deserialize, Serialize};

use crate::domain::{BarSeries, Direction};

use super::swing::{SwingKind, SwingPoint};

/// Bars scanned backward from the evaluation bar for a sweep candidate.
/// Also bounds the swing window each candidate may take liquidity from.
const SWEEP_WINDOW: usize = 20;

/// A bar that pierced a swing level and closed back inside.
///
/// A bearish sweep takes out buy-side liquidity above a swing high and
/// proposes shorts; a bullish sweep mirrors that below a swing low.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquiditySweep {
    pub direction: Direction,
    pub swept_price: f64,
    pub sweep_bar: usize,
    pub is_cluster: bool,
    pub cluster_size: usize,
    /// Penetration past the swept level, in points.
    pub magnitude: f64,
}

/// Find the most recent sweep within the last [`SWEEP_WINDOW`] bars.
///
/// Candidates are scanned newest first so a fresh sweep shadows an older
/// one; at each candidate the bearish read is checked before the bullish
/// read. The target level is the extreme swing of the prior 20 bars: the
/// highest swing high for a bearish sweep, the lowest swing low for a
/// bullish one.
pub fn detect_sweep(
    series: &BarSeries,
    swings: &[SwingPoint],
    current: usize,
    min_distance: f64,
) -> Option<LiquiditySweep> {
    let oldest = current.saturating_sub(SWEEP_WINDOW);
    for candidate in (oldest..=current).rev() {
        if let Some(sweep) = sweep_at(series, swings, candidate, min_distance) {
            return Some(sweep);
        }
    }
    None
}

fn sweep_at(
    series: &BarSeries,
    swings: &[SwingPoint],
    candidate: usize,
    min_distance: f64,
) -> Option<LiquiditySweep> {
    let bar = &series[candidate];
    let window: Vec<&SwingPoint> = swings
        .iter()
        .filter(|s| s.index < candidate && candidate - s.index <= SWEEP_WINDOW)
        .collect();

    // Buy-side liquidity above the highest swing high.
    if let Some(swing) = window
        .iter()
        .filter(|s| s.kind == SwingKind::High)
        .max_by(|a, b| a.price.total_cmp(&b.price))
    {
        if bar.high > swing.price + min_distance && bar.close < swing.price {
            return Some(LiquiditySweep {
                direction: Direction::Bearish,
                swept_price: swing.price,
                sweep_bar: candidate,
                is_cluster: swing.is_cluster,
                cluster_size: swing.cluster_size,
                magnitude: bar.high - swing.price,
            });
        }
    }

    // Sell-side liquidity below the lowest swing low.
    if let Some(swing) = window
        .iter()
        .filter(|s| s.kind == SwingKind::Low)
        .min_by(|a, b| a.price.total_cmp(&b.price))
    {
        if bar.low < swing.price - min_distance && bar.close > swing.price {
            return Some(LiquiditySweep {
                direction: Direction::Bullish,
                swept_price: swing.price,
                sweep_bar: candidate,
                is_cluster: swing.is_cluster,
                cluster_size: swing.cluster_size,
                magnitude: swing.price - bar.low,
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::{TimeZone, Utc};

    fn flat_series(n: usize, close: f64) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar {
                time: Utc.timestamp_opt(1_700_000_000 + i as i64 * 900, 0).unwrap(),
                open: close - 0.1,
                high: close + 0.2,
                low: close - 0.2,
                close,
                volume: 1_000.0,
                atr: Some(2.0),
            })
            .collect()
    }

    fn swing(index: usize, price: f64, kind: SwingKind) -> SwingPoint {
        SwingPoint {
            index,
            price,
            kind,
            is_cluster: false,
            cluster_size: 1,
        }
    }

    #[test]
    fn bullish_sweep_pierces_low_and_recloses() {
        let mut bars = flat_series(30, 100.0);
        // bar 25 dives through the swing low at 95 and closes back above it
        bars[25].low = 89.0;
        bars[25].open = 95.5;
        bars[25].close = 96.0;
        bars[25].high = 96.2;
        let series = BarSeries::new(bars).unwrap();
        let swings = vec![swing(10, 95.0, SwingKind::Low)];

        let sweep = detect_sweep(&series, &swings, 29, 5.0).unwrap();
        assert_eq!(sweep.direction, Direction::Bullish);
        assert_eq!(sweep.sweep_bar, 25);
        assert_eq!(sweep.swept_price, 95.0);
        assert!((sweep.magnitude - 6.0).abs() < 1e-12);
    }

    #[test]
    fn shallow_pierce_is_not_a_sweep() {
        let mut bars = flat_series(30, 100.0);
        // only 3 points below the level, under the 5 point minimum
        bars[25].low = 92.0;
        bars[25].open = 95.5;
        bars[25].close = 96.0;
        bars[25].high = 96.2;
        let series = BarSeries::new(bars).unwrap();
        let swings = vec![swing(10, 95.0, SwingKind::Low)];
        assert!(detect_sweep(&series, &swings, 29, 5.0).is_none());
    }

    #[test]
    fn close_beyond_level_is_a_breakout_not_a_sweep() {
        let mut bars = flat_series(30, 100.0);
        bars[25].low = 89.0;
        bars[25].open = 94.0;
        bars[25].close = 94.5; // stays below the swept level
        bars[25].high = 95.0;
        let series = BarSeries::new(bars).unwrap();
        let swings = vec![swing(10, 95.0, SwingKind::Low)];
        assert!(detect_sweep(&series, &swings, 29, 5.0).is_none());
    }

    #[test]
    fn bearish_sweep_targets_highest_swing_high() {
        let mut bars = flat_series(30, 100.0);
        bars[25].high = 112.0;
        bars[25].open = 100.0;
        bars[25].close = 104.0;
        bars[25].low = 99.8;
        let series = BarSeries::new(bars).unwrap();
        // two swing highs in range: the sweep must key off the higher one
        let swings = vec![
            swing(8, 103.0, SwingKind::High),
            swing(15, 105.0, SwingKind::High),
        ];
        let sweep = detect_sweep(&series, &swings, 29, 5.0).unwrap();
        assert_eq!(sweep.direction, Direction::Bearish);
        assert_eq!(sweep.swept_price, 105.0);
        assert!((sweep.magnitude - 7.0).abs() < 1e-12);
    }

    #[test]
    fn newer_sweep_shadows_older_one() {
        let mut bars = flat_series(40, 100.0);
        for &i in &[20, 30] {
            bars[i].low = 89.0;
            bars[i].open = 95.5;
            bars[i].close = 96.0;
            bars[i].high = 96.2;
        }
        let series = BarSeries::new(bars).unwrap();
        let swings = vec![swing(10, 95.0, SwingKind::Low), swing(25, 95.0, SwingKind::Low)];
        let sweep = detect_sweep(&series, &swings, 39, 5.0).unwrap();
        assert_eq!(sweep.sweep_bar, 30);
    }

    #[test]
    fn cluster_flag_propagates_from_swept_swing() {
        let mut bars = flat_series(30, 100.0);
        bars[25].low = 89.0;
        bars[25].open = 95.5;
        bars[25].close = 96.0;
        bars[25].high = 96.2;
        let series = BarSeries::new(bars).unwrap();
        let mut swept = swing(10, 95.0, SwingKind::Low);
        swept.is_cluster = true;
        swept.cluster_size = 3;
        let sweep = detect_sweep(&series, &[swept], 29, 5.0).unwrap();
        assert!(sweep.is_cluster);
        assert_eq!(sweep.cluster_size, 3);
    }

    #[test]
    fn swings_outside_window_are_ignored() {
        let mut bars = flat_series(60, 100.0);
        bars[55].low = 89.0;
        bars[55].open = 95.5;
        bars[55].close = 96.0;
        bars[55].high = 96.2;
        let series = BarSeries::new(bars).unwrap();
        // swept level formed 40 bars before the sweeping bar
        let swings = vec![swing(15, 95.0, SwingKind::Low)];
        assert!(detect_sweep(&series, &swings, 59, 5.0).is_none());
    }
}
