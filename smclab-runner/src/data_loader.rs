//! CSV bar loading for the runner.
//!
//! Expected columns: `time,open,high,low,close,volume[,atr]`. Timestamps
//! are RFC 3339 or epoch seconds. When the ATR column is absent or empty
//! the loader fills it with a 14-period rolling mean of the true range,
//! leaving the first bars unset so the series' fallback applies there.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

use smclab_core::domain::{Bar, BarError, BarSeries};

/// True-range averaging window.
pub const ATR_PERIOD: usize = 14;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("bad bar data: {0}")]
    Bar(#[from] BarError),
    #[error("row {row}: unparseable timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },
}

#[derive(Debug, Deserialize)]
struct CsvBar {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    atr: Option<f64>,
}

/// Loaded series plus a content fingerprint for report provenance.
#[derive(Debug)]
pub struct LoadedBars {
    pub series: BarSeries,
    /// BLAKE3 over the raw rows, hex-encoded.
    pub dataset_hash: String,
}

fn parse_timestamp(raw: &str, row: usize) -> Result<DateTime<Utc>, LoadError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(epoch) = raw.parse::<i64>() {
        if let Some(dt) = Utc.timestamp_opt(epoch, 0).single() {
            return Ok(dt);
        }
    }
    Err(LoadError::BadTimestamp {
        row,
        value: raw.to_string(),
    })
}

/// Load a bar series from a CSV file.
pub fn load_bars_csv(path: &Path) -> Result<LoadedBars, LoadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut bars = Vec::new();

    for (idx, record) in reader.deserialize::<CsvBar>().enumerate() {
        let record = record?;
        hasher.update(record.time.as_bytes());
        hasher.update(&record.close.to_le_bytes());
        hasher.update(&record.volume.to_le_bytes());
        let time = parse_timestamp(record.time.trim(), idx + 1)?;
        bars.push(Bar {
            time,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
            atr: record.atr,
        });
    }

    fill_missing_atr(&mut bars);
    let series = BarSeries::new(bars)?;
    Ok(LoadedBars {
        series,
        dataset_hash: hasher.finalize().to_hex().to_string(),
    })
}

/// Fill unset ATR values with a rolling true-range mean.
///
/// The first `ATR_PERIOD - 1` bars stay unset when missing; consumers
/// fall back to the series default there. Bars that already carry an ATR
/// keep it.
pub fn fill_missing_atr(bars: &mut [Bar]) {
    if bars.is_empty() {
        return;
    }
    let mut true_ranges = Vec::with_capacity(bars.len());
    true_ranges.push(bars[0].high - bars[0].low);
    for i in 1..bars.len() {
        let prev_close = bars[i - 1].close;
        let tr = (bars[i].high - bars[i].low)
            .max((bars[i].high - prev_close).abs())
            .max((bars[i].low - prev_close).abs());
        true_ranges.push(tr);
    }

    for i in 0..bars.len() {
        if bars[i].atr.is_some() {
            continue;
        }
        if i + 1 < ATR_PERIOD {
            continue;
        }
        let window = &true_ranges[i + 1 - ATR_PERIOD..=i];
        bars[i].atr = Some(window.iter().sum::<f64>() / ATR_PERIOD as f64);
    }
}
