//! Broker cost model — spread, slippage, and commission.

use serde::{Deserialize, Serialize};

use crate::domain::Side;

/// Execution costs in pips plus per-lot commission.
///
/// Spread is charged on long entries only: short fills already sit on the
/// bid. Slippage applies against the trader on every fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub slippage_pips: f64,
    pub spread_pips: f64,
    pub commission_per_lot: f64,
    pub pip_size: f64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            slippage_pips: 1.0,
            spread_pips: 0.3,
            commission_per_lot: 7.0,
            pip_size: 0.01,
        }
    }
}

impl BrokerConfig {
    /// A frictionless broker, for isolating strategy behavior in tests.
    pub fn frictionless() -> Self {
        Self {
            slippage_pips: 0.0,
            spread_pips: 0.0,
            commission_per_lot: 0.0,
            pip_size: 0.01,
        }
    }

    pub fn apply_entry(&self, price: f64, side: Side) -> f64 {
        let spread = self.spread_pips * self.pip_size;
        let slippage = self.slippage_pips * self.pip_size;
        match side {
            Side::Long => price + spread + slippage,
            Side::Short => price - slippage,
        }
    }

    pub fn apply_exit(&self, price: f64, side: Side) -> f64 {
        let slippage = self.slippage_pips * self.pip_size;
        match side {
            Side::Long => price - slippage,
            Side::Short => price + slippage,
        }
    }

    /// Round-trip commission: charged per lot on entry and exit.
    pub fn round_trip_commission(&self, lots: f64) -> f64 {
        self.commission_per_lot * lots * 2.0
    }
}
