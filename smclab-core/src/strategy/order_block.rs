//! Order block detection — the last opposing candle before a structure
//! break, qualified by volume and rejection wick.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, BarSeries, Direction};

/// An institutional footprint candle. For a bullish setup this is the last
/// down-close candle before the break; price returning into its range is
/// expected to find support.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBlock {
    pub direction: Direction,
    pub high: f64,
    pub low: f64,
    pub bar: usize,
    pub volume_percentile: f64,
    pub has_rejection_wick: bool,
    /// 0.6 weight on volume rank, 0.4 on the rejection wick.
    pub quality: f64,
}

impl OrderBlock {
    pub fn overlaps(&self, low: f64, high: f64) -> bool {
        self.low <= high && self.high >= low
    }
}

/// Scan backward from the break bar for the nearest opposing candle whose
/// volume ranks at or above `min_percentile` within the lookback window.
///
/// The volume rank is the share of window bars trading strictly less volume.
/// The rejection wick is the wick opposite the body: the lower wick for a
/// down-close candle, the upper wick for an up-close one, and it qualifies
/// at 0.6x the body size.
pub fn find_order_block(
    series: &BarSeries,
    direction: Direction,
    break_bar: usize,
    lookback: usize,
    min_percentile: f64,
) -> Option<OrderBlock> {
    let start = break_bar.saturating_sub(lookback);
    let window = &series.bars()[start..=break_bar];
    let percentile = |volume: f64| {
        window.iter().filter(|b| b.volume < volume).count() as f64 / window.len() as f64 * 100.0
    };

    for i in (start + 1..=break_bar).rev() {
        let bar = &series[i];
        let opposing = match direction {
            Direction::Bullish => bar.is_bearish(),
            Direction::Bearish => bar.is_bullish(),
        };
        if !opposing {
            continue;
        }
        let volume_percentile = percentile(bar.volume);
        if volume_percentile < min_percentile {
            continue;
        }
        let wick = rejection_wick(bar, direction);
        let has_rejection_wick = wick >= bar.body() * 0.6;
        let quality = volume_percentile / 100.0 * 0.6 + if has_rejection_wick { 0.4 } else { 0.0 };
        return Some(OrderBlock {
            direction,
            high: bar.high,
            low: bar.low,
            bar: i,
            volume_percentile,
            has_rejection_wick,
            quality,
        });
    }
    None
}

fn rejection_wick(bar: &Bar, direction: Direction) -> f64 {
    match direction {
        Direction::Bullish => bar.lower_wick(),
        Direction::Bearish => bar.upper_wick(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(i: usize, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Bar {
        Bar {
            time: Utc.timestamp_opt(1_700_000_000 + i as i64 * 900, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume,
            atr: Some(2.0),
        }
    }

    fn base_series(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| bar(i, 99.9, 100.4, 99.6, 100.1, 1_000.0))
            .collect()
    }

    #[test]
    fn finds_nearest_opposing_candle_with_volume() {
        let mut bars = base_series(20);
        // two bearish candles before the break at 15; the nearer one carries
        // the volume spike
        bars[12] = bar(12, 100.5, 100.8, 99.8, 100.0, 900.0);
        bars[14] = bar(14, 100.7, 101.1, 99.6, 99.8, 5_000.0);
        let series = BarSeries::new(bars).unwrap();

        let ob = find_order_block(&series, Direction::Bullish, 15, 15, 60.0).unwrap();
        assert_eq!(ob.bar, 14);
        assert_eq!(ob.high, 101.1);
        assert_eq!(ob.low, 99.6);
        assert!(ob.volume_percentile >= 90.0);
    }

    #[test]
    fn low_volume_candle_is_skipped_not_terminal() {
        let mut bars = base_series(20);
        // nearest bearish candle is thin; an earlier one qualifies
        bars[14] = bar(14, 100.5, 100.8, 99.8, 100.0, 10.0);
        bars[11] = bar(11, 100.7, 101.1, 99.6, 99.8, 5_000.0);
        let series = BarSeries::new(bars).unwrap();

        let ob = find_order_block(&series, Direction::Bullish, 15, 15, 60.0).unwrap();
        assert_eq!(ob.bar, 11);
    }

    #[test]
    fn rejection_wick_is_opposite_the_body() {
        let mut bars = base_series(20);
        // bearish candle, body 0.5, lower wick (close - low) = 0.4 >= 0.3
        bars[14] = bar(14, 100.5, 100.6, 99.6, 100.0, 5_000.0);
        let series = BarSeries::new(bars).unwrap();
        let ob = find_order_block(&series, Direction::Bullish, 15, 15, 60.0).unwrap();
        assert!(ob.has_rejection_wick);
        let expected = ob.volume_percentile / 100.0 * 0.6 + 0.4;
        assert!((ob.quality - expected).abs() < 1e-12);
    }

    #[test]
    fn short_lower_wick_fails_rejection() {
        let mut bars = base_series(20);
        // bearish candle, body 1.0, lower wick only 0.1
        bars[14] = bar(14, 101.0, 101.2, 99.9, 100.0, 5_000.0);
        let series = BarSeries::new(bars).unwrap();
        let ob = find_order_block(&series, Direction::Bullish, 15, 15, 60.0).unwrap();
        assert!(!ob.has_rejection_wick);
        assert!(ob.quality < 0.6 + 1e-12);
    }

    #[test]
    fn bearish_setup_wants_bullish_candle() {
        let mut bars = base_series(20);
        // all base bars are bullish; push volume up on bar 15 so the nearest
        // up-close candle qualifies
        bars[15] = bar(15, 99.8, 101.0, 99.7, 100.6, 5_000.0);
        let series = BarSeries::new(bars).unwrap();
        let ob = find_order_block(&series, Direction::Bearish, 15, 15, 60.0).unwrap();
        assert_eq!(ob.bar, 15);
        assert_eq!(ob.direction, Direction::Bearish);
    }

    #[test]
    fn no_opposing_candle_in_window() {
        // every bar closes up: no bearish candle for a bullish setup
        let bars = base_series(20);
        let series = BarSeries::new(bars).unwrap();
        assert!(find_order_block(&series, Direction::Bullish, 15, 15, 60.0).is_none());
    }
}
