//! Serializable run configuration.
//!
//! One TOML file drives the whole lab: `[strategy]`, `[broker]`,
//! `[risk]`, `[backtest]`, `[sim]`, `[walk_forward]` and `[monte_carlo]`
//! sections, every field defaulted so a partial file works. A run id is
//! a content hash of the fully-resolved config, so two runs with
//! identical parameters share an id.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use smclab_core::risk::RiskConfig;
use smclab_core::sim::{BrokerConfig, SimConfig};
use smclab_core::strategy::{ConfigError, StrategyConfig};

use crate::monte_carlo::MonteCarloConfig;
use crate::runner::BacktestConfig;
use crate::walk_forward::WalkForwardConfig;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("io error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid strategy config: {0}")]
    Strategy(#[from] ConfigError),
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
}

/// Complete configuration for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub symbol: String,
    pub timeframe: String,
    pub strategy: StrategyConfig,
    pub broker: BrokerConfig,
    pub risk: RiskConfig,
    pub backtest: BacktestConfig,
    pub sim: SimConfig,
    pub walk_forward: WalkForwardConfig,
    pub monte_carlo: MonteCarloConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            symbol: "XAUUSD".to_string(),
            timeframe: "M15".to_string(),
            strategy: StrategyConfig::default(),
            broker: BrokerConfig::default(),
            risk: RiskConfig::default(),
            backtest: BacktestConfig::default(),
            sim: SimConfig::default(),
            walk_forward: WalkForwardConfig::default(),
            monte_carlo: MonteCarloConfig::default(),
        }
    }
}

impl RunConfig {
    /// Read and validate a TOML config file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigFileError> {
        let raw = std::fs::read_to_string(path)?;
        let config: RunConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), ConfigFileError> {
        self.strategy.validate()?;
        if self.backtest.initial_balance <= 0.0 {
            return Err(ConfigFileError::NonPositive {
                field: "backtest.initial_balance",
                value: self.backtest.initial_balance,
            });
        }
        if self.backtest.risk_pct <= 0.0 {
            return Err(ConfigFileError::NonPositive {
                field: "backtest.risk_pct",
                value: self.backtest.risk_pct,
            });
        }
        Ok(())
    }

    /// Deterministic content hash of the resolved configuration.
    pub fn run_id(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
