//! Supply/demand zones — consolidation envelopes ahead of impulse moves.

use serde::{Deserialize, Serialize};

use crate::domain::BarSeries;

/// Bars of the impulse window: the zone prints when five consecutive
/// closes travel far enough.
const IMPULSE_SPAN: usize = 5;

/// Bars before the impulse collapsed into the zone envelope.
const ENVELOPE_SPAN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    /// Consolidation before an impulse up; expected to absorb selling.
    Demand,
    /// Consolidation before an impulse down.
    Supply,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub kind: ZoneKind,
    pub high: f64,
    pub low: f64,
    /// First bar of the impulse that created the zone.
    pub origin_bar: usize,
    /// Impulse size in ATR multiples at the origin bar.
    pub impulse_atr_mult: f64,
    pub retest_count: usize,
    pub is_fresh: bool,
    /// Impulse size capped at 3 ATR, discounted 40% once tested.
    pub quality: f64,
}

impl Zone {
    pub fn overlaps(&self, low: f64, high: f64) -> bool {
        self.low <= high && self.high >= low
    }

    /// A zone retested more than once is considered spent.
    pub fn is_stale(&self) -> bool {
        !self.is_fresh && self.retest_count > 1
    }
}

/// Scan the lookback window ending at `current` for impulse moves and
/// collect the consolidation envelopes that precede them.
///
/// An impulse is a net close-to-close move of at least
/// `min_impulse_atr` ATRs across [`IMPULSE_SPAN`] bars. The zone envelope
/// spans the highs/lows of up to [`ENVELOPE_SPAN`] bars before the
/// impulse. Every bar between impulse end and `current` that trades into
/// the envelope counts as a retest and clears freshness.
pub fn detect_zones(
    series: &BarSeries,
    current: usize,
    lookback: usize,
    min_impulse_atr: f64,
) -> Vec<Zone> {
    let mut zones = Vec::new();
    if current < IMPULSE_SPAN {
        return zones;
    }
    let start = current.saturating_sub(lookback);
    for i in start..current - IMPULSE_SPAN {
        let price_move = series[i + IMPULSE_SPAN - 1].close - series[i].close;
        let atr = series.atr_at(i);
        if price_move.abs() < min_impulse_atr * atr {
            continue;
        }
        let env_start = i.saturating_sub(ENVELOPE_SPAN);
        if env_start == i {
            // impulse at the very front of the series has no envelope
            continue;
        }
        let envelope = &series.bars()[env_start..i];
        let high = envelope.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let low = envelope.iter().map(|b| b.low).fold(f64::MAX, f64::min);

        let mut retest_count = 0;
        for j in i + IMPULSE_SPAN..current {
            let bar = &series[j];
            if bar.low <= high && bar.high >= low {
                retest_count += 1;
            }
        }
        let is_fresh = retest_count == 0;
        let impulse_atr_mult = price_move.abs() / atr;
        let quality =
            (impulse_atr_mult / 3.0).min(1.0) * if is_fresh { 1.0 } else { 0.6 };
        zones.push(Zone {
            kind: if price_move > 0.0 {
                ZoneKind::Demand
            } else {
                ZoneKind::Supply
            },
            high,
            low,
            origin_bar: i,
            impulse_atr_mult,
            retest_count,
            is_fresh,
            quality,
        });
    }
    zones
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::{TimeZone, Utc};

    fn bar(i: usize, close: f64) -> Bar {
        Bar {
            time: Utc.timestamp_opt(1_700_000_000 + i as i64 * 900, 0).unwrap(),
            open: close - 0.2,
            high: close + 0.4,
            low: close - 0.4,
            close,
            volume: 1_000.0,
            atr: Some(2.0),
        }
    }

    /// Consolidation around 100 in bars 0..10, impulse up to 108 over bars
    /// 10..=14, then drift far above the envelope.
    fn impulse_series(tail_close: f64, n: usize) -> BarSeries {
        let mut bars: Vec<Bar> = (0..10).map(|i| bar(i, 100.0 + (i % 3) as f64 * 0.2)).collect();
        for (k, close) in [102.0, 104.0, 106.0, 107.0, 108.2].iter().enumerate() {
            bars.push(bar(10 + k, *close));
        }
        for i in 15..n {
            bars.push(bar(i, tail_close));
        }
        BarSeries::new(bars).unwrap()
    }

    #[test]
    fn impulse_prints_demand_zone_with_envelope() {
        let series = impulse_series(108.0, 30);
        let zones = detect_zones(&series, 29, 50, 2.0);
        let zone = zones.iter().find(|z| z.origin_bar == 10).unwrap();
        assert_eq!(zone.kind, ZoneKind::Demand);
        // envelope spans bars 2..10: highs up to 100.4 + 0.4
        assert!((zone.high - 100.8).abs() < 1e-9);
        assert!((zone.low - 99.6).abs() < 1e-9);
        assert!(zone.is_fresh);
        assert_eq!(zone.retest_count, 0);
        // impulse 6.2 points over 2.0 ATR: mult 3.1, quality capped at 1.0
        assert!((zone.quality - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weak_move_prints_no_zone() {
        let mut bars: Vec<Bar> = (0..30).map(|i| bar(i, 100.0)).collect();
        bars[14] = bar(14, 101.0); // 1 point over 5 bars, needs 4
        let series = BarSeries::new(bars).unwrap();
        assert!(detect_zones(&series, 29, 50, 2.0).is_empty());
    }

    #[test]
    fn retests_clear_freshness_and_discount_quality() {
        // tail trades back inside the envelope
        let series = impulse_series(100.5, 30);
        let zones = detect_zones(&series, 29, 50, 2.0);
        let zone = zones.iter().find(|z| z.origin_bar == 10).unwrap();
        assert!(!zone.is_fresh);
        assert!(zone.retest_count > 1);
        assert!(zone.is_stale());
        assert!((zone.quality - 0.6).abs() < 1e-9);
    }

    #[test]
    fn supply_zone_from_impulse_down() {
        let mut bars: Vec<Bar> = (0..10).map(|i| bar(i, 100.0)).collect();
        for (k, close) in [98.0, 96.0, 94.0, 93.0, 92.0].iter().enumerate() {
            bars.push(bar(10 + k, *close));
        }
        for i in 15..30 {
            bars.push(bar(i, 92.0));
        }
        let series = BarSeries::new(bars).unwrap();
        let zones = detect_zones(&series, 29, 50, 2.0);
        let zone = zones.iter().find(|z| z.origin_bar == 10).unwrap();
        assert_eq!(zone.kind, ZoneKind::Supply);
    }

    #[test]
    fn impulse_without_preceding_bars_is_skipped() {
        let mut bars: Vec<Bar> = Vec::new();
        for (k, close) in [100.0, 102.0, 104.0, 106.0, 108.0].iter().enumerate() {
            bars.push(bar(k, *close));
        }
        for i in 5..20 {
            bars.push(bar(i, 108.0));
        }
        let series = BarSeries::new(bars).unwrap();
        let zones = detect_zones(&series, 19, 50, 2.0);
        assert!(zones.iter().all(|z| z.origin_bar != 0));
    }
}
