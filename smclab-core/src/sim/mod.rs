//! Trade simulation: broker cost model and the partial-exit state machine.

pub mod broker;
pub mod simulator;

pub use broker::BrokerConfig;
pub use simulator::{SimConfig, SimError, TradeSimulator};
