//! StrategyConfig — every knob of the detection pipeline in one struct.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Detection pipeline configuration.
///
/// Defaults are tuned for XAUUSD M15, where one point is one dollar of
/// gold price. Distances (`sweep_min_distance`, `cluster_tolerance`,
/// `stop_buffer`) are in price points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Bars on each side a pivot must dominate.
    pub swing_lookback: usize,
    /// Minimum penetration past the swept level, in points.
    pub sweep_min_distance: f64,
    /// Price tolerance grouping swings into equal-high/equal-low clusters.
    pub cluster_tolerance: f64,
    /// How far back from the structure break an order block may sit.
    pub ob_lookback: usize,
    /// Volume percentile an order block candle must reach.
    pub ob_volume_percentile: f64,
    /// Reject setups without an order block overlapping the entry imbalance.
    pub ob_required: bool,
    /// Bars scanned for supply/demand zones.
    pub zone_lookback: usize,
    /// Minimum 5-bar impulse, in ATR multiples, to print a zone.
    pub min_impulse_atr: f64,
    /// Reject longs in premium and shorts in discount.
    pub premium_discount_filter: bool,
    /// Confluence score floor for emitting a signal.
    pub min_confidence: f64,
    /// ATR multiple floor for stop distance.
    pub stop_atr_mult: f64,
    /// Extra points behind the swept level for the structural stop.
    pub stop_buffer: f64,
    pub min_lot: f64,
    pub max_lot: f64,
    /// Dollar value of one pip per lot.
    pub tick_value: f64,
    pub pip_size: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            swing_lookback: 2,
            sweep_min_distance: 5.0,
            cluster_tolerance: 5.0,
            ob_lookback: 15,
            ob_volume_percentile: 60.0,
            ob_required: true,
            zone_lookback: 50,
            min_impulse_atr: 2.0,
            premium_discount_filter: true,
            min_confidence: 0.65,
            stop_atr_mult: 2.0,
            stop_buffer: 2.0,
            min_lot: 0.01,
            max_lot: 100.0,
            tick_value: 1.0,
            pip_size: 0.0001,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("swing_lookback must be at least 1")]
    ZeroLookback,
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("min_lot {min} exceeds max_lot {max}")]
    LotBoundsInverted { min: f64, max: f64 },
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.swing_lookback == 0 {
            return Err(ConfigError::ZeroLookback);
        }
        let non_negative: [(&'static str, f64); 4] = [
            ("sweep_min_distance", self.sweep_min_distance),
            ("cluster_tolerance", self.cluster_tolerance),
            ("stop_buffer", self.stop_buffer),
            ("min_impulse_atr", self.min_impulse_atr),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::OutOfRange {
                field: "min_confidence",
                value: self.min_confidence,
            });
        }
        if !(0.0..=100.0).contains(&self.ob_volume_percentile) {
            return Err(ConfigError::OutOfRange {
                field: "ob_volume_percentile",
                value: self.ob_volume_percentile,
            });
        }
        if self.stop_atr_mult <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "stop_atr_mult",
                value: self.stop_atr_mult,
            });
        }
        if self.pip_size <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "pip_size",
                value: self.pip_size,
            });
        }
        if self.tick_value <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "tick_value",
                value: self.tick_value,
            });
        }
        if self.min_lot <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "min_lot",
                value: self.min_lot,
            });
        }
        if self.min_lot > self.max_lot {
            return Err(ConfigError::LotBoundsInverted {
                min: self.min_lot,
                max: self.max_lot,
            });
        }
        Ok(())
    }
}
