//! Policy constants for scenario simulation
//!
//! Every strategy receives a `ScenarioConfig` explicitly so simulations can be
//! re-run against alternate policy values without touching globals.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Divisor converting a capital asset's recurring amount into a pension
pub const DEFAULT_PENSION_COEFFICIENT: f64 = 200.0;

/// Monthly pension that capitalization must never push a client below
pub const DEFAULT_MINIMUM_PENSION: f64 = 5_500.0;

/// Annual discount rate for NPV
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.03;

/// Age to which cash flows are projected for NPV
pub const DEFAULT_TARGET_AGE: u32 = 90;

/// Maximum share of pension value the balanced strategy capitalizes
pub const DEFAULT_NPV_CAPITALIZATION_SHARE: f64 = 0.5;

pub const DEFAULT_RETIREMENT_AGE: u32 = 67;

fn default_pension_coefficient() -> f64 { DEFAULT_PENSION_COEFFICIENT }
fn default_minimum_pension() -> f64 { DEFAULT_MINIMUM_PENSION }
fn default_discount_rate() -> f64 { DEFAULT_DISCOUNT_RATE }
fn default_target_age() -> u32 { DEFAULT_TARGET_AGE }
fn default_npv_share() -> f64 { DEFAULT_NPV_CAPITALIZATION_SHARE }
fn default_retirement_age() -> u32 { DEFAULT_RETIREMENT_AGE }

/// Configuration shared by the orchestrator and all strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Capital-to-pension divisor (capital / coefficient = monthly pension)
    #[serde(default = "default_pension_coefficient")]
    pub pension_coefficient: f64,

    /// Minimum monthly pension floor
    #[serde(default = "default_minimum_pension")]
    pub minimum_pension: f64,

    /// Annual discount rate (0.03 = 3%)
    #[serde(default = "default_discount_rate")]
    pub discount_rate: f64,

    /// NPV horizon ends at this age
    #[serde(default = "default_target_age")]
    pub target_age: u32,

    /// Share of total pension value the balanced strategy may capitalize
    #[serde(default = "default_npv_share")]
    pub npv_capitalization_share: f64,

    /// Retirement age used when the caller does not request one
    #[serde(default = "default_retirement_age")]
    pub default_retirement_age: u32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            pension_coefficient: DEFAULT_PENSION_COEFFICIENT,
            minimum_pension: DEFAULT_MINIMUM_PENSION,
            discount_rate: DEFAULT_DISCOUNT_RATE,
            target_age: DEFAULT_TARGET_AGE,
            npv_capitalization_share: DEFAULT_NPV_CAPITALIZATION_SHARE,
            default_retirement_age: DEFAULT_RETIREMENT_AGE,
        }
    }
}

impl ScenarioConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ScenarioConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Override the minimum pension floor
    pub fn with_minimum_pension(mut self, floor: f64) -> Self {
        self.minimum_pension = floor;
        self
    }

    /// Override the annual discount rate
    pub fn with_discount_rate(mut self, rate: f64) -> Self {
        self.discount_rate = rate;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.pension_coefficient > 0.0) {
            return Err(EngineError::Config(format!(
                "pension_coefficient must be positive, got {}",
                self.pension_coefficient
            )));
        }
        if self.minimum_pension < 0.0 || !self.minimum_pension.is_finite() {
            return Err(EngineError::Config(format!(
                "minimum_pension must be non-negative, got {}",
                self.minimum_pension
            )));
        }
        if !(0.0..=1.0).contains(&self.npv_capitalization_share) {
            return Err(EngineError::Config(format!(
                "npv_capitalization_share must be within [0, 1], got {}",
                self.npv_capitalization_share
            )));
        }
        if !self.discount_rate.is_finite() || self.discount_rate <= -1.0 {
            return Err(EngineError::Config(format!(
                "discount_rate must be finite and exceed -100%, got {}",
                self.discount_rate
            )));
        }
        if self.target_age == 0 {
            return Err(EngineError::Config("target_age must be positive".into()));
        }
        Ok(())
    }

    /// NPV horizon in years: at least one year
    pub fn horizon_years(&self, retirement_age: u32) -> u32 {
        self.target_age.saturating_sub(retirement_age).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: ScenarioConfig =
            serde_json::from_str(r#"{ "minimum_pension": 4000.0 }"#).unwrap();
        assert_eq!(config.minimum_pension, 4000.0);
        assert_eq!(config.pension_coefficient, DEFAULT_PENSION_COEFFICIENT);
        assert_eq!(config.target_age, 90);
    }

    #[test]
    fn test_horizon_never_below_one_year() {
        let config = ScenarioConfig::default();
        assert_eq!(config.horizon_years(67), 23);
        assert_eq!(config.horizon_years(90), 1);
        assert_eq!(config.horizon_years(95), 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ScenarioConfig::default();
        config.pension_coefficient = 0.0;
        assert!(config.validate().is_err());

        let config = ScenarioConfig { npv_capitalization_share: 1.5, ..Default::default() };
        assert!(config.validate().is_err());

        assert!(ScenarioConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite_discount_rate() {
        for rate in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let config = ScenarioConfig::default().with_discount_rate(rate);
            assert!(matches!(config.validate(), Err(EngineError::Config(_))), "rate {}", rate);
        }
    }
}
