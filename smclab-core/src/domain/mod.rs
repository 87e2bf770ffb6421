//! Domain types: bars, signals, trades.

pub mod bar;
pub mod signal;
pub mod trade;

pub use bar::{Bar, BarError, BarSeries, DEFAULT_ATR, MIN_SERIES_LEN};
pub use signal::{
    Bias, Direction, PartialExit, Provenance, RangePosition, Side, Signal, StructureKind,
    SweepKind,
};
pub use trade::{ExitReason, TradeRecord};
