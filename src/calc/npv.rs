//! Discounted-cash-flow NPV of a retirement income stream
//!
//! The annual discount rate is converted to an equivalent monthly rate,
//! `(1 + r)^(1/12) - 1`, and each month's constant income is discounted by
//! `(1 + monthly_rate)^month`. A one-time capital amount is added undiscounted
//! at month 0.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_DISCOUNT_RATE;

/// Inputs to an NPV calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NpvInputs {
    /// Monthly pension paid every month of the horizon
    pub monthly_pension: f64,

    /// Other recurring monthly income
    pub other_income: f64,

    /// Capital received at month 0, not discounted
    pub one_time_capital: Option<f64>,

    /// Horizon in years
    pub years: u32,

    /// Annual discount rate
    pub discount_rate: f64,
}

impl NpvInputs {
    pub fn new(monthly_pension: f64, other_income: f64, years: u32) -> Self {
        Self {
            monthly_pension,
            other_income,
            one_time_capital: None,
            years,
            discount_rate: DEFAULT_DISCOUNT_RATE,
        }
    }

    pub fn with_capital(mut self, capital: f64) -> Self {
        self.one_time_capital = Some(capital);
        self
    }

    pub fn with_discount_rate(mut self, rate: f64) -> Self {
        self.discount_rate = rate;
        self
    }
}

/// Equivalent monthly rate for an annual effective rate
pub fn monthly_rate_from_annual(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0
}

/// Round to cents
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// NPV of a constant monthly stream plus optional month-0 capital, in cents
pub fn calculate_npv_dcf(inputs: &NpvInputs) -> f64 {
    let monthly_rate = monthly_rate_from_annual(inputs.discount_rate);
    let monthly_income = inputs.monthly_pension + inputs.other_income;
    let months = inputs.years * 12;

    let discounted: f64 = (1..=months)
        .map(|month| monthly_income / (1.0 + monthly_rate).powi(month as i32))
        .sum();

    round_currency(discounted + inputs.one_time_capital.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_monthly_rate_compounds_to_annual() {
        let monthly = monthly_rate_from_annual(0.03);
        assert_relative_eq!((1.0 + monthly).powi(12), 1.03, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_rate_is_plain_sum() {
        let inputs = NpvInputs::new(1_000.0, 500.0, 2).with_discount_rate(0.0);
        assert_eq!(calculate_npv_dcf(&inputs), 36_000.0);
    }

    #[test]
    fn test_capital_added_undiscounted() {
        let base = NpvInputs::new(1_000.0, 0.0, 10);
        let with_capital = base.with_capital(250_000.0);
        assert_relative_eq!(
            calculate_npv_dcf(&with_capital) - calculate_npv_dcf(&base),
            250_000.0,
            epsilon = 0.011
        );
    }

    #[test]
    fn test_matches_annuity_closed_form() {
        // Ordinary annuity: PV = P * (1 - (1+i)^-n) / i
        let inputs = NpvInputs::new(5_000.0, 0.0, 23);
        let i = monthly_rate_from_annual(0.03);
        let n = 23 * 12;
        let expected = 5_000.0 * (1.0 - (1.0 + i).powi(-(n as i32))) / i;
        assert_relative_eq!(calculate_npv_dcf(&inputs), expected, epsilon = 0.01);
    }

    #[test]
    fn test_higher_rate_strictly_lowers_npv() {
        let mut previous = f64::MAX;
        for rate in [0.0, 0.01, 0.03, 0.05, 0.08] {
            let npv = calculate_npv_dcf(&NpvInputs::new(4_000.0, 800.0, 20).with_discount_rate(rate));
            assert!(npv < previous, "rate {} gave {} >= {}", rate, npv, previous);
            previous = npv;
        }
    }

    #[test]
    fn test_longer_horizon_never_lowers_npv() {
        let mut previous = 0.0;
        for years in 1..=40 {
            let npv = calculate_npv_dcf(&NpvInputs::new(3_000.0, 0.0, years));
            assert!(npv >= previous);
            previous = npv;
        }
    }
}
