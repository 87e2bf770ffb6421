//! Signal construction — levels, sizing, and the partial-exit plan.

use crate::domain::{
    BarSeries, Direction, PartialExit, Provenance, RangePosition, Signal, SweepKind,
};

use super::config::StrategyConfig;
use super::fvg::FairValueGap;
use super::order_block::OrderBlock;
use super::structure::Structure;
use super::sweep::LiquiditySweep;
use super::swing::{SwingKind, SwingPoint};
use super::zones::Zone;

/// Runner target must clear this many R to be worth holding for.
const RUNNER_MIN_R: f64 = 2.5;

pub struct SignalParts<'a> {
    pub sweep: &'a LiquiditySweep,
    pub structure: &'a Structure,
    pub order_block: Option<&'a OrderBlock>,
    pub fvg: &'a FairValueGap,
    pub zones: &'a [Zone],
    pub swings: &'a [SwingPoint],
    pub range_position: RangePosition,
    pub htf_aligned: bool,
    pub itf_aligned: bool,
    pub confidence: f64,
}

/// Assemble the tradeable signal once every detection stage has passed.
///
/// Entry is the imbalance midpoint. The stop hides behind the swept level
/// plus buffer, widened to an ATR floor when structure sits too close.
/// Targets 1 and 2 are fixed at 1R and 2R; target 3 is the nearest
/// opposing liquidity on the profit side, kept only past
/// [`RUNNER_MIN_R`]. The partial plan closes 50% at target 1 (arming the
/// breakeven stop), 30% at target 2, and runs 20% when a third target
/// exists.
#[allow(clippy::too_many_arguments)]
pub fn build_signal(
    series: &BarSeries,
    cfg: &StrategyConfig,
    symbol: &str,
    timeframe: &str,
    parts: &SignalParts<'_>,
    balance: f64,
    risk_pct: f64,
    current: usize,
) -> Signal {
    let direction = parts.structure.direction;
    let side = direction.side();
    let entry = parts.fvg.midpoint;
    let atr = series.atr_at(current);
    let atr_floor = atr * cfg.stop_atr_mult;

    let structural = match direction {
        Direction::Bullish => entry - (parts.sweep.swept_price - cfg.stop_buffer),
        Direction::Bearish => (parts.sweep.swept_price + cfg.stop_buffer) - entry,
    };
    let stop_distance = structural.max(atr_floor);
    let sign = side.sign();
    let stop = entry - sign * stop_distance;

    let target_1 = entry + sign * stop_distance;
    let target_2 = entry + sign * 2.0 * stop_distance;
    let target_3 = runner_target(parts.swings, direction, entry, stop_distance);

    let risk_dollars = balance * risk_pct / 100.0;
    let stop_pips = stop_distance / cfg.pip_size;
    let lots = (risk_dollars / (stop_pips * cfg.tick_value)).clamp(cfg.min_lot, cfg.max_lot);

    let mut partial_plan = vec![
        PartialExit {
            level: target_1,
            close_fraction: 0.5,
            move_stop_to_breakeven: true,
            trail: false,
        },
        PartialExit {
            level: target_2,
            close_fraction: 0.3,
            move_stop_to_breakeven: false,
            trail: true,
        },
    ];
    if let Some(level) = target_3 {
        partial_plan.push(PartialExit {
            level,
            close_fraction: 0.2,
            move_stop_to_breakeven: false,
            trail: true,
        });
    }

    let sweep_kind = if parts.sweep.is_cluster {
        match direction {
            Direction::Bearish => SweepKind::EqualHighs,
            Direction::Bullish => SweepKind::EqualLows,
        }
    } else {
        SweepKind::Single
    };
    let zone_origin = parts
        .zones
        .iter()
        .find(|z| parts.fvg.overlaps(z.low, z.high))
        .map(|z| z.origin_bar);

    Signal {
        symbol: symbol.to_string(),
        timeframe: timeframe.to_string(),
        side,
        entry,
        stop,
        target_1,
        target_2,
        target_3,
        confidence: parts.confidence,
        risk_r: 1.0,
        lots,
        partial_plan,
        provenance: Provenance {
            sweep_kind,
            sweep_bar: parts.sweep.sweep_bar,
            swept_price: parts.sweep.swept_price,
            cluster_size: parts.sweep.cluster_size,
            structure_kind: parts.structure.kind,
            structure_bar: parts.structure.break_bar,
            order_block: parts.order_block.is_some(),
            zone_origin,
            range_position: parts.range_position,
            htf_aligned: parts.htf_aligned,
            itf_aligned: parts.itf_aligned,
        },
        signal_bar: current,
        posted_at: series[current].time,
    }
}

/// Nearest opposing swing liquidity on the profit side of the entry,
/// kept only when it pays more than [`RUNNER_MIN_R`].
fn runner_target(
    swings: &[SwingPoint],
    direction: Direction,
    entry: f64,
    stop_distance: f64,
) -> Option<f64> {
    let opposing = match direction {
        Direction::Bullish => SwingKind::High,
        Direction::Bearish => SwingKind::Low,
    };
    let profit_side = |price: f64| match direction {
        Direction::Bullish => price > entry,
        Direction::Bearish => price < entry,
    };
    let nearest = swings
        .iter()
        .filter(|s| s.kind == opposing && profit_side(s.price))
        .min_by(|a, b| {
            (a.price - entry)
                .abs()
                .total_cmp(&(b.price - entry).abs())
        })?;
    if (nearest.price - entry).abs() > RUNNER_MIN_R * stop_distance {
        Some(nearest.price)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, Side, StructureKind};
    use chrono::{TimeZone, Utc};

    fn series(n: usize) -> BarSeries {
        let bars: Vec<Bar> = (0..n)
            .map(|i| Bar {
                time: Utc.timestamp_opt(1_700_000_000 + i as i64 * 900, 0).unwrap(),
                open: 99.9,
                high: 100.4,
                low: 99.6,
                close: 100.1,
                volume: 1_000.0,
                atr: Some(2.0),
            })
            .collect();
        BarSeries::new(bars).unwrap()
    }

    fn sweep(swept_price: f64) -> LiquiditySweep {
        LiquiditySweep {
            direction: Direction::Bullish,
            swept_price,
            sweep_bar: 40,
            is_cluster: false,
            cluster_size: 1,
            magnitude: 6.0,
        }
    }

    fn structure(direction: Direction) -> Structure {
        Structure {
            kind: StructureKind::Reversal,
            direction,
            break_bar: 45,
            broken_level: 100.0,
            strength: 0.5,
        }
    }

    fn fvg_at(midpoint: f64) -> FairValueGap {
        FairValueGap {
            direction: Direction::Bullish,
            high: midpoint + 0.2,
            low: midpoint - 0.2,
            midpoint,
            bar: 47,
            size: 0.4,
        }
    }

    fn parts<'a>(
        sweep: &'a LiquiditySweep,
        structure: &'a Structure,
        fvg: &'a FairValueGap,
        swings: &'a [SwingPoint],
    ) -> SignalParts<'a> {
        SignalParts {
            sweep,
            structure,
            order_block: None,
            fvg,
            zones: &[],
            swings,
            range_position: RangePosition::Discount,
            htf_aligned: true,
            itf_aligned: false,
            confidence: 0.8,
        }
    }

    #[test]
    fn structural_stop_hides_behind_swept_level() {
        let series = series(48);
        let cfg = StrategyConfig::default();
        let sw = sweep(95.0);
        let st = structure(Direction::Bullish);
        let fv = fvg_at(101.2);
        let signal = build_signal(
            &series,
            &cfg,
            "XAUUSD",
            "M15",
            &parts(&sw, &st, &fv, &[]),
            10_000.0,
            1.0,
            47,
        );
        // structural distance 101.2 - 93.0 = 8.2 beats the 4.0 ATR floor
        assert_eq!(signal.side, Side::Long);
        assert!((signal.stop - 93.0).abs() < 1e-9);
        assert!((signal.target_1 - 109.4).abs() < 1e-9);
        assert!((signal.target_2 - 117.6).abs() < 1e-9);
        assert_eq!(signal.target_3, None);
        assert_eq!(signal.partial_plan.len(), 2);
        assert!(signal.partial_plan[0].move_stop_to_breakeven);
    }

    #[test]
    fn atr_floor_widens_tight_structural_stop() {
        let series = series(48);
        let cfg = StrategyConfig::default();
        let sw = sweep(100.0); // swept level right under the entry
        let st = structure(Direction::Bullish);
        let fv = fvg_at(101.2);
        let signal = build_signal(
            &series,
            &cfg,
            "XAUUSD",
            "M15",
            &parts(&sw, &st, &fv, &[]),
            10_000.0,
            1.0,
            47,
        );
        // structural 101.2 - 98.0 = 3.2 loses to ATR floor 4.0
        assert!((signal.stop - 97.2).abs() < 1e-9);
    }

    #[test]
    fn short_signal_mirrors_levels() {
        let series = series(48);
        let cfg = StrategyConfig::default();
        let mut sw = sweep(107.0);
        sw.direction = Direction::Bearish;
        let st = structure(Direction::Bearish);
        let fv = fvg_at(101.2);
        let signal = build_signal(
            &series,
            &cfg,
            "XAUUSD",
            "M15",
            &parts(&sw, &st, &fv, &[]),
            10_000.0,
            1.0,
            47,
        );
        assert_eq!(signal.side, Side::Short);
        // structural distance (107 + 2) - 101.2 = 7.8
        assert!((signal.stop - 109.0).abs() < 1e-9);
        assert!((signal.target_1 - 93.4).abs() < 1e-9);
    }

    #[test]
    fn distant_liquidity_becomes_runner_target() {
        let series = series(48);
        let cfg = StrategyConfig::default();
        let sw = sweep(95.0);
        let st = structure(Direction::Bullish);
        let fv = fvg_at(101.2); // 1R = 8.2
        let swings = vec![
            SwingPoint {
                index: 20,
                price: 130.0, // 28.8 above entry, past 2.5R = 20.5
                kind: SwingKind::High,
                is_cluster: false,
                cluster_size: 1,
            },
            SwingPoint {
                index: 30,
                price: 90.0, // below entry: not a profit-side target for longs
                kind: SwingKind::High,
                is_cluster: false,
                cluster_size: 1,
            },
        ];
        let signal = build_signal(
            &series,
            &cfg,
            "XAUUSD",
            "M15",
            &parts(&sw, &st, &fv, &swings),
            10_000.0,
            1.0,
            47,
        );
        assert_eq!(signal.target_3, Some(130.0));
        assert_eq!(signal.partial_plan.len(), 3);
        assert!((signal.partial_plan[2].close_fraction - 0.2).abs() < 1e-12);
    }

    #[test]
    fn nearby_liquidity_is_no_runner() {
        let series = series(48);
        let cfg = StrategyConfig::default();
        let sw = sweep(95.0);
        let st = structure(Direction::Bullish);
        let fv = fvg_at(101.2);
        let swings = vec![SwingPoint {
            index: 20,
            price: 110.0, // 8.8 above entry, inside 2.5R
            kind: SwingKind::High,
            is_cluster: false,
            cluster_size: 1,
        }];
        let signal = build_signal(
            &series,
            &cfg,
            "XAUUSD",
            "M15",
            &parts(&sw, &st, &fv, &swings),
            10_000.0,
            1.0,
            47,
        );
        assert_eq!(signal.target_3, None);
    }

    #[test]
    fn lot_size_clamps_to_bounds() {
        let series = series(48);
        let mut cfg = StrategyConfig::default();
        cfg.pip_size = 0.0001;
        let sw = sweep(95.0);
        let st = structure(Direction::Bullish);
        let fv = fvg_at(101.2);
        // 8.2 points = 82,000 pips of stop: raw sizing collapses below min lot
        let signal = build_signal(
            &series,
            &cfg,
            "XAUUSD",
            "M15",
            &parts(&sw, &st, &fv, &[]),
            10_000.0,
            1.0,
            47,
        );
        assert_eq!(signal.lots, cfg.min_lot);

        // coarse pip and huge balance push sizing above max lot
        cfg.pip_size = 1.0;
        let signal = build_signal(
            &series,
            &cfg,
            "XAUUSD",
            "M15",
            &parts(&sw, &st, &fv, &[]),
            100_000_000.0,
            1.0,
            47,
        );
        assert_eq!(signal.lots, cfg.max_lot);
    }
}
