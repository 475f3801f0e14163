//! Retirement strategies and the orchestrator that compares them

mod base;
mod capitalize;
pub mod max_capital;
pub mod max_npv;
pub mod max_pension;
mod runner;

pub use base::{ScenarioBuilder, ScenarioContext, ScenarioId, ScenarioRequest, ScenarioResult};
pub use capitalize::{
    capitalizable_pension, capitalize_worst_first, eligible_funds, pension_value, CapitalizationLimits,
    CapitalizationSummary,
};
pub use max_capital::MaxCapitalScenario;
pub use max_npv::MaxNpvScenario;
pub use max_pension::MaxPensionScenario;
pub use runner::{ScenarioComparison, ScenarioRunner};
