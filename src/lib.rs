//! Retirement scenarios - payout strategy engine for pension and capital holdings
//!
//! This library provides:
//! - Holding models (pension funds, capital assets, additional income, termination grants)
//! - Conversion, termination, portfolio import and commutation exemption services
//! - Snapshot/restore of a client's holdings
//! - Max-Pension, Max-Capital and balanced Max-NPV strategies with DCF scoring
//! - An orchestrator comparing all strategies against one starting state

pub mod action;
pub mod calc;
pub mod config;
pub mod convert;
pub mod error;
pub mod holdings;
pub mod scenarios;
pub mod services;
pub mod store;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use action::{Action, ActionLog, ActionType};
pub use config::ScenarioConfig;
pub use error::{EngineError, Result};
pub use holdings::{CapitalAsset, Client, PensionFund, Provenance, TerminationEvent};
pub use scenarios::{ScenarioComparison, ScenarioId, ScenarioRequest, ScenarioResult, ScenarioRunner};
pub use store::{HoldingsRepository, InMemoryRepository};
