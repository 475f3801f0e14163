//! Pure calculation utilities: dates, annuity arithmetic and NPV

pub mod annuity;
pub mod dates;
mod npv;

pub use annuity::{capital_from_pension, pension_from_balance, pension_from_capital};
pub use dates::retirement_year;
pub use npv::{calculate_npv_dcf, monthly_rate_from_annual, round_currency, NpvInputs};
