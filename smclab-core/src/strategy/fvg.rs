//! Fair value gap — a three-candle imbalance whose midpoint anchors the
//! entry.

use serde::{Deserialize, Serialize};

use crate::domain::{BarSeries, Direction};

/// A price imbalance between candle 1 and candle 3 of a three-bar window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairValueGap {
    pub direction: Direction,
    pub high: f64,
    pub low: f64,
    pub midpoint: f64,
    /// Index of the third candle.
    pub bar: usize,
    pub size: f64,
}

impl FairValueGap {
    pub fn overlaps(&self, low: f64, high: f64) -> bool {
        self.low <= high && self.high >= low
    }
}

/// Check the three candles ending at `current` for an imbalance in the
/// given direction.
///
/// Bullish: the first candle's high sits below the third candle's low
/// (candle 2 moved so fast it left untraded prices). Bearish mirrors it.
/// A zero-width gap (exact touch) does not count.
pub fn find_fvg(series: &BarSeries, direction: Direction, current: usize) -> Option<FairValueGap> {
    if current < 2 {
        return None;
    }
    let c1 = &series[current - 2];
    let c3 = &series[current];
    match direction {
        Direction::Bullish if c1.high < c3.low => Some(FairValueGap {
            direction,
            high: c3.low,
            low: c1.high,
            midpoint: (c3.low + c1.high) / 2.0,
            bar: current,
            size: c3.low - c1.high,
        }),
        Direction::Bearish if c1.low > c3.high => Some(FairValueGap {
            direction,
            high: c1.low,
            low: c3.high,
            midpoint: (c1.low + c3.high) / 2.0,
            bar: current,
            size: c1.low - c3.high,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::{TimeZone, Utc};

    fn bar(i: usize, high: f64, low: f64) -> Bar {
        Bar {
            time: Utc.timestamp_opt(1_700_000_000 + i as i64 * 900, 0).unwrap(),
            open: (high + low) / 2.0,
            high,
            low,
            close: (high + low) / 2.0,
            volume: 1_000.0,
            atr: Some(2.0),
        }
    }

    #[test]
    fn bullish_gap_between_c1_high_and_c3_low() {
        let series = BarSeries::new(vec![
            bar(0, 101.0, 100.0),
            bar(1, 103.5, 100.8),
            bar(2, 104.0, 102.0),
        ])
        .unwrap();
        let fvg = find_fvg(&series, Direction::Bullish, 2).unwrap();
        assert_eq!(fvg.low, 101.0);
        assert_eq!(fvg.high, 102.0);
        assert!((fvg.midpoint - 101.5).abs() < 1e-12);
        assert!((fvg.size - 1.0).abs() < 1e-12);
    }

    #[test]
    fn touching_candles_leave_no_gap() {
        let series = BarSeries::new(vec![
            bar(0, 102.0, 100.0),
            bar(1, 103.0, 100.8),
            bar(2, 104.0, 102.0), // c3 low == c1 high
        ])
        .unwrap();
        assert!(find_fvg(&series, Direction::Bullish, 2).is_none());
    }

    #[test]
    fn bearish_gap_between_c1_low_and_c3_high() {
        let series = BarSeries::new(vec![
            bar(0, 104.0, 102.0),
            bar(1, 102.5, 99.5),
            bar(2, 101.0, 99.0),
        ])
        .unwrap();
        let fvg = find_fvg(&series, Direction::Bearish, 2).unwrap();
        assert_eq!(fvg.high, 102.0);
        assert_eq!(fvg.low, 101.0);
        assert!((fvg.size - 1.0).abs() < 1e-12);
    }

    #[test]
    fn direction_mismatch_finds_nothing() {
        let series = BarSeries::new(vec![
            bar(0, 101.0, 100.0),
            bar(1, 103.5, 100.8),
            bar(2, 104.0, 102.0),
        ])
        .unwrap();
        assert!(find_fvg(&series, Direction::Bearish, 2).is_none());
    }

    #[test]
    fn overlap_is_inclusive() {
        let fvg = FairValueGap {
            direction: Direction::Bullish,
            high: 102.0,
            low: 101.0,
            midpoint: 101.5,
            bar: 2,
            size: 1.0,
        };
        assert!(fvg.overlaps(102.0, 105.0)); // touching edge counts
        assert!(fvg.overlaps(99.0, 101.0));
        assert!(!fvg.overlaps(102.1, 105.0));
    }
}
