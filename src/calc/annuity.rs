//! Annuity arithmetic between balances, capital and monthly pensions

use crate::error::{EngineError, Result};

fn check_divisor(holding: &str, factor: f64) -> Result<()> {
    if factor > 0.0 && factor.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidAnnuityFactor {
            holding: holding.to_string(),
            factor,
        })
    }
}

/// Monthly pension bought by `balance` at `annuity_factor`
pub fn pension_from_balance(holding: &str, balance: f64, annuity_factor: f64) -> Result<f64> {
    check_divisor(holding, annuity_factor)?;
    if balance < 0.0 {
        return Err(EngineError::InvalidAmount { field: "balance", value: balance });
    }
    Ok(balance / annuity_factor)
}

/// Capital value of a monthly pension at `annuity_factor`
pub fn capital_from_pension(pension: f64, annuity_factor: f64) -> f64 {
    pension * annuity_factor
}

/// Pension equivalent of a capital amount at the fixed pension coefficient
pub fn pension_from_capital(holding: &str, capital: f64, coefficient: f64) -> Result<f64> {
    check_divisor(holding, coefficient)?;
    Ok(capital / coefficient)
}
