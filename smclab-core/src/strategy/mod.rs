//! Detection pipeline: swings, sweeps, structure, order blocks, fair
//! value gaps, zones, confluence scoring, and signal assembly.

pub mod config;
pub mod confluence;
pub mod engine;
pub mod fvg;
pub mod order_block;
pub mod signal_builder;
pub mod structure;
pub mod sweep;
pub mod swing;
pub mod zones;

pub use config::{ConfigError, StrategyConfig};
pub use engine::{MarketContext, StrategyEngine};
pub use fvg::FairValueGap;
pub use order_block::OrderBlock;
pub use structure::Structure;
pub use sweep::LiquiditySweep;
pub use swing::{SwingKind, SwingPoint};
pub use zones::{Zone, ZoneKind};
