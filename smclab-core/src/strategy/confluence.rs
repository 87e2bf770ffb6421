//! Confluence scoring — premium/discount classification and the additive
//! confidence model.

use crate::domain::{Direction, RangePosition, StructureKind};

use super::fvg::FairValueGap;
use super::order_block::OrderBlock;
use super::structure::Structure;
use super::sweep::LiquiditySweep;
use super::swing::{SwingKind, SwingPoint};
use super::zones::Zone;

/// Swings considered when framing the dealing range.
const RANGE_SWINGS: usize = 10;

/// Place `entry` inside the envelope of the last [`RANGE_SWINGS`] swings.
///
/// Bullish entries at or below the midpoint read as discount, above as
/// premium; bearish entries mirror that. Fewer than two swings, or a
/// window missing either kind, reads neutral.
pub fn classify_range_position(
    swings: &[SwingPoint],
    entry: f64,
    direction: Direction,
) -> RangePosition {
    if swings.len() < 2 {
        return RangePosition::Neutral;
    }
    let start = swings.len().saturating_sub(RANGE_SWINGS);
    let recent = &swings[start..];
    let range_high = recent
        .iter()
        .filter(|s| s.kind == SwingKind::High)
        .map(|s| s.price)
        .fold(f64::NAN, f64::max);
    let range_low = recent
        .iter()
        .filter(|s| s.kind == SwingKind::Low)
        .map(|s| s.price)
        .fold(f64::NAN, f64::min);
    if range_high.is_nan() || range_low.is_nan() {
        return RangePosition::Neutral;
    }
    let midpoint = (range_high + range_low) / 2.0;
    match direction {
        Direction::Bullish => {
            if entry <= midpoint {
                RangePosition::Discount
            } else {
                RangePosition::Premium
            }
        }
        Direction::Bearish => {
            if entry >= midpoint {
                RangePosition::Premium
            } else {
                RangePosition::Discount
            }
        }
    }
}

/// True when the entry sits on the cheap side of the range for its
/// direction: longs in discount, shorts in premium.
pub fn position_fits_direction(direction: Direction, position: RangePosition) -> bool {
    matches!(
        (direction, position),
        (Direction::Bullish, RangePosition::Discount)
            | (Direction::Bearish, RangePosition::Premium)
    )
}

/// Everything the confidence model weighs.
pub struct ConfluenceInputs<'a> {
    pub sweep: &'a LiquiditySweep,
    pub structure: &'a Structure,
    pub order_block: Option<&'a OrderBlock>,
    pub fvg: &'a FairValueGap,
    pub zones: &'a [Zone],
    pub range_position: RangePosition,
    pub htf_aligned: bool,
    pub itf_aligned: bool,
}

/// Additive confidence in [0, 1].
///
/// Base 0.50, then:
/// - reversal break +0.12, continuation +0.05
/// - order block overlapping the entry imbalance +0.10 x quality
/// - best fresh zone overlapping it +0.15 x quality
/// - cluster sweep +0.20, single-level sweep +0.08
/// - higher-timeframe alignment +0.20, intermediate +0.10
/// - entry on the wrong side of the range -0.15
/// - any stale multi-tested zone in view -0.10
pub fn score_confidence(inputs: &ConfluenceInputs<'_>) -> f64 {
    let mut confidence = 0.50;

    confidence += match inputs.structure.kind {
        StructureKind::Reversal => 0.12,
        StructureKind::Continuation => 0.05,
    };

    if let Some(ob) = inputs.order_block {
        if inputs.fvg.overlaps(ob.low, ob.high) {
            confidence += 0.10 * ob.quality;
        }
    }

    let best_fresh = inputs
        .zones
        .iter()
        .filter(|z| z.is_fresh && inputs.fvg.overlaps(z.low, z.high))
        .max_by(|a, b| a.quality.total_cmp(&b.quality));
    if let Some(zone) = best_fresh {
        confidence += 0.15 * zone.quality;
    }

    confidence += if inputs.sweep.is_cluster { 0.20 } else { 0.08 };

    if inputs.htf_aligned {
        confidence += 0.20;
    }
    if inputs.itf_aligned {
        confidence += 0.10;
    }

    if inputs.range_position != RangePosition::Neutral
        && !position_fits_direction(inputs.structure.direction, inputs.range_position)
    {
        confidence -= 0.15;
    }

    if inputs.zones.iter().any(|z| z.is_stale()) {
        confidence -= 0.10;
    }

    confidence.clamp(0.0, 1.0)
}
