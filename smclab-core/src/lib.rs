//! SMCLab Core — detection pipeline, trade simulation, risk management.
//!
//! This crate contains the heart of the backtesting lab:
//! - Domain types (bars, signals, trades)
//! - Smart-money detection pipeline: swings, liquidity sweeps, structure
//!   breaks, order blocks, fair value gaps, supply/demand zones
//! - Confluence scoring and signal assembly with a partial-exit plan
//! - Path-dependent trade simulator with breakeven and time-stop handling
//! - Risk manager with daily stops and a rolling drawdown throttle

pub mod domain;
pub mod risk;
pub mod sim;
pub mod strategy;
