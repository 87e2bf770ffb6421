//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ATR fallback used when a bar carries no volatility estimate.
///
/// Expressed in price points; tuned for metals-style quoting where one
/// point is a meaningful fraction of daily range.
pub const DEFAULT_ATR: f64 = 10.0;

/// Minimum bars a series must hold: a three-candle imbalance is the
/// smallest pattern the pipeline looks at.
pub const MIN_SERIES_LEN: usize = 3;

/// OHLCV bar for a single symbol on a single intraday timeframe.
///
/// `atr` is an optional precomputed average true range at this bar; loaders
/// fill it, detectors fall back to [`DEFAULT_ATR`] when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub atr: Option<f64>,
}

impl Bar {
    /// Basic OHLC sanity check: high is the top of the range, low the bottom.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open.is_finite()
            && self.close.is_finite()
            && self.volume >= 0.0
    }

    /// Absolute body size.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Wick below the body.
    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// Wick above the body.
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }
}

#[derive(Debug, Error)]
pub enum BarError {
    #[error("bar series too short: {len} bars, need at least {min}")]
    TooShort { len: usize, min: usize },
    #[error("timestamps not strictly ascending at index {index}")]
    NonMonotonic { index: usize },
    #[error("malformed OHLC at index {index}")]
    Malformed { index: usize },
}

/// Validated, time-ascending bar series.
///
/// Construction rejects short, unordered, or malformed input so downstream
/// detectors never need to re-check bar shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, BarError> {
        if bars.len() < MIN_SERIES_LEN {
            return Err(BarError::TooShort {
                len: bars.len(),
                min: MIN_SERIES_LEN,
            });
        }
        for (i, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(BarError::Malformed { index: i });
            }
            if i > 0 && bar.time <= bars[i - 1].time {
                return Err(BarError::NonMonotonic { index: i });
            }
        }
        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn last(&self) -> &Bar {
        // non-empty by construction
        &self.bars[self.bars.len() - 1]
    }

    /// ATR at bar `index`, falling back to [`DEFAULT_ATR`].
    pub fn atr_at(&self, index: usize) -> f64 {
        match self.bars[index].atr {
            Some(atr) if atr > 0.0 => atr,
            _ => DEFAULT_ATR,
        }
    }

    /// Sub-series covering `start..end`. The slice inherits the parent's
    /// validation, so no re-checking happens here.
    pub fn window(&self, start: usize, end: usize) -> BarSeries {
        BarSeries {
            bars: self.bars[start..end].to_vec(),
        }
    }
}

impl std::ops::Index<usize> for BarSeries {
    type Output = Bar;

    fn index(&self, index: usize) -> &Bar {
        &self.bars[index]
    }
}
