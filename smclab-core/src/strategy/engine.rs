//! StrategyEngine — orchestrates the detection pipeline into a
//! detect-or-reject pass per bar.

use crate::domain::{BarSeries, Bias, Signal};

use super::config::{ConfigError, StrategyConfig};
use super::confluence::{
    classify_range_position, position_fits_direction, score_confidence, ConfluenceInputs,
};
use super::fvg::find_fvg;
use super::order_block::find_order_block;
use super::signal_builder::{build_signal, SignalParts};
use super::structure::confirm_structure;
use super::sweep::detect_sweep;
use super::swing::{detect_swings, mark_clusters};
use super::zones::detect_zones;

/// Per-evaluation market state supplied by the caller: higher-timeframe
/// bias readings and sizing inputs.
#[derive(Debug, Clone)]
pub struct MarketContext {
    pub htf_bias: Bias,
    pub itf_bias: Bias,
    pub balance: f64,
    /// Percent of balance risked per trade, already throttled if the risk
    /// manager is in drawdown mode.
    pub risk_pct: f64,
}

/// The stateless detection pipeline. All state lives in the bar series;
/// evaluating bar `current` sees only `bars[..=current]`.
#[derive(Debug, Clone)]
pub struct StrategyEngine {
    config: StrategyConfig,
    symbol: String,
    timeframe: String,
}

impl StrategyEngine {
    pub fn new(
        config: StrategyConfig,
        symbol: impl Into<String>,
        timeframe: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            symbol: symbol.into(),
            timeframe: timeframe.into(),
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Run the full pipeline against the series as of bar `current`.
    ///
    /// Stages run in order and any failure rejects the bar: sweep,
    /// structure break, order block (when required, it must overlap the
    /// entry imbalance), fair value gap, premium/discount filter, and
    /// finally the confidence floor. Timeframe bias disagreements never
    /// reject on their own; they only cost score.
    pub fn generate_signal(
        &self,
        series: &BarSeries,
        current: usize,
        ctx: &MarketContext,
    ) -> Option<Signal> {
        let current = current.min(series.len() - 1);
        let cfg = &self.config;

        let mut swings = detect_swings(series, cfg.swing_lookback, current);
        mark_clusters(&mut swings, cfg.cluster_tolerance);

        let sweep = detect_sweep(series, &swings, current, cfg.sweep_min_distance)?;
        let structure = confirm_structure(
            series,
            &swings,
            sweep.sweep_bar,
            sweep.direction,
            current,
        )?;
        let direction = structure.direction;

        let order_block = find_order_block(
            series,
            direction,
            structure.break_bar,
            cfg.ob_lookback,
            cfg.ob_volume_percentile,
        );
        if cfg.ob_required && order_block.is_none() {
            return None;
        }

        let fvg = find_fvg(series, direction, current)?;
        if cfg.ob_required {
            let ob = order_block.as_ref()?;
            if !fvg.overlaps(ob.low, ob.high) {
                return None;
            }
        }

        let zones = detect_zones(series, current, cfg.zone_lookback, cfg.min_impulse_atr);

        let range_position = classify_range_position(&swings, fvg.midpoint, direction);
        if cfg.premium_discount_filter
            && range_position != crate::domain::RangePosition::Neutral
            && !position_fits_direction(direction, range_position)
        {
            return None;
        }

        let htf_aligned = ctx.htf_bias == direction.bias();
        let itf_aligned = ctx.itf_bias == direction.bias();
        let confidence = score_confidence(&ConfluenceInputs {
            sweep: &sweep,
            structure: &structure,
            order_block: order_block.as_ref(),
            fvg: &fvg,
            zones: &zones,
            range_position,
            htf_aligned,
            itf_aligned,
        });
        if confidence < cfg.min_confidence {
            return None;
        }

        Some(build_signal(
            series,
            cfg,
            &self.symbol,
            &self.timeframe,
            &SignalParts {
                sweep: &sweep,
                structure: &structure,
                order_block: order_block.as_ref(),
                fvg: &fvg,
                zones: &zones,
                swings: &swings,
                range_position,
                htf_aligned,
                itf_aligned,
                confidence,
            },
            ctx.balance,
            ctx.risk_pct,
            current,
        ))
    }
}
