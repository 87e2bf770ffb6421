//! Risk manager — per-trade risk bookkeeping, daily stops, and the
//! rolling drawdown throttle.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

/// Sizing multiplier while the drawdown throttle is active.
const THROTTLE_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Daily loss limit in R; trading halts for the day at or below it.
    pub daily_stop_r: f64,
    /// Cap on aggregate open risk in R.
    pub max_concurrent_r: f64,
    /// Rolling-window loss (in R) that activates the throttle.
    pub drawdown_threshold_r: f64,
    /// Trades in the rolling window.
    pub rolling_window: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            daily_stop_r: -3.0,
            max_concurrent_r: 2.0,
            drawdown_threshold_r: 6.0,
            rolling_window: 5,
        }
    }
}

/// Tracks open risk, daily totals, and recent performance.
///
/// Aggregate open risk is maintained incrementally as trades register and
/// unregister; [`RiskManager::open_risk_sum`] recomputes it from the map
/// for invariant checks. The throttle is level-triggered on the rolling
/// window sum: it activates when the window is at or below the threshold
/// loss and releases as soon as newer results lift the sum back above it.
#[derive(Debug)]
pub struct RiskManager {
    config: RiskConfig,
    open_risk: HashMap<String, f64>,
    aggregate_open_r: f64,
    rolling_pnl_r: VecDeque<f64>,
    throttle_active: bool,
    daily_pnl_dollars: f64,
    daily_pnl_r: f64,
    trades_today: usize,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            open_risk: HashMap::new(),
            aggregate_open_r: 0.0,
            rolling_pnl_r: VecDeque::new(),
            throttle_active: false,
            daily_pnl_dollars: 0.0,
            daily_pnl_r: 0.0,
            trades_today: 0,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Whether a new trade may open: the daily stop has not fired, the
    /// day's absolute swing stays under the drawdown threshold, and
    /// aggregate open risk sits below the concurrency cap.
    pub fn can_trade(&self) -> bool {
        if self.daily_pnl_r <= self.config.daily_stop_r {
            return false;
        }
        if self.daily_pnl_r.abs() >= self.config.drawdown_threshold_r {
            return false;
        }
        self.aggregate_open_r < self.config.max_concurrent_r
    }

    /// Register a trade's risk under its id. Re-registering an id replaces
    /// its old risk rather than double-counting it.
    pub fn register_trade(&mut self, id: impl Into<String>, risk_r: f64) {
        let id = id.into();
        if let Some(previous) = self.open_risk.insert(id, risk_r) {
            self.aggregate_open_r -= previous;
        }
        self.aggregate_open_r += risk_r;
    }

    /// Release a trade's risk. Unknown ids are ignored.
    pub fn unregister_trade(&mut self, id: &str) {
        if let Some(risk_r) = self.open_risk.remove(id) {
            self.aggregate_open_r -= risk_r;
        }
    }

    /// Record a closed trade's result into the daily totals and the
    /// rolling window, then re-evaluate the throttle.
    pub fn record_result(&mut self, pnl_dollars: f64, pnl_r: f64) {
        self.daily_pnl_dollars += pnl_dollars;
        self.daily_pnl_r += pnl_r;
        self.trades_today += 1;

        self.rolling_pnl_r.push_back(pnl_r);
        while self.rolling_pnl_r.len() > self.config.rolling_window {
            self.rolling_pnl_r.pop_front();
        }
        self.throttle_active = self.rolling_sum() <= -self.config.drawdown_threshold_r;
    }

    /// Per-trade risk percent after throttling.
    pub fn effective_risk_pct(&self, base_risk_pct: f64) -> f64 {
        if self.throttle_active {
            base_risk_pct * THROTTLE_FACTOR
        } else {
            base_risk_pct
        }
    }

    /// R-units a new trade commits, shrunk with sizing under throttle.
    pub fn effective_risk_r(&self, base_risk_r: f64) -> f64 {
        if self.throttle_active {
            base_risk_r * THROTTLE_FACTOR
        } else {
            base_risk_r
        }
    }

    /// New trading day: daily totals clear, the open-risk map and the
    /// rolling window survive the roll.
    pub fn reset_daily(&mut self) {
        self.daily_pnl_dollars = 0.0;
        self.daily_pnl_r = 0.0;
        self.trades_today = 0;
    }

    pub fn aggregate_open_r(&self) -> f64 {
        self.aggregate_open_r
    }

    /// Reference sum over the open-risk map, for invariant checks against
    /// the incremental aggregate.
    pub fn open_risk_sum(&self) -> f64 {
        self.open_risk.values().sum()
    }

    pub fn open_trade_count(&self) -> usize {
        self.open_risk.len()
    }

    pub fn throttle_active(&self) -> bool {
        self.throttle_active
    }

    pub fn rolling_sum(&self) -> f64 {
        self.rolling_pnl_r.iter().sum()
    }

    pub fn daily_pnl_r(&self) -> f64 {
        self.daily_pnl_r
    }

    pub fn daily_pnl_dollars(&self) -> f64 {
        self.daily_pnl_dollars
    }

    pub fn trades_today(&self) -> usize {
        self.trades_today
    }
}
