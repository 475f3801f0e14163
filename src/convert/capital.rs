//! Transforms that produce capital rows: pension commutation and education
//! fund capitalization

use crate::calc::capital_from_pension;
use crate::error::{EngineError, Result};
use crate::holdings::{CapitalAsset, HoldingId, PensionFund, Provenance, TaxTreatment};

use super::records::PensionFundRecord;

/// Pension below this is rounding dust and counts as fully commuted
const PENSION_EPSILON: f64 = 0.005;

/// Result of commuting (part of) a pension
#[derive(Debug, Clone)]
pub struct Commutation {
    /// New capital row (not yet persisted)
    pub capital: CapitalAsset,
    /// Monthly pension removed from the source fund
    pub pension_commuted: f64,
    /// Capital value created, `pension_commuted * annuity_factor`
    pub capital_amount: f64,
    pub partial: bool,
}

/// Commute `pension_portion` of a fund's monthly pension into capital
///
/// The capital is `pension_portion * annuity_factor`, recorded as a zero
/// lump-sum asset with the amount in `monthly_income`. The source keeps its
/// row: a partial commutation reduces it, a full one zeroes it and marks it
/// converted. Validation happens before the fund is touched.
pub fn commute_pension(
    fund: &mut PensionFund,
    pension_portion: f64,
    new_id: HoldingId,
) -> Result<Commutation> {
    let factor = fund.required_annuity_factor()?;
    let pension = fund.monthly_pension();
    if !(pension_portion > 0.0) || pension_portion > pension + PENSION_EPSILON {
        return Err(EngineError::InvalidAmount {
            field: "pension_portion",
            value: pension_portion,
        });
    }

    let original = PensionFundRecord::from(&*fund);
    let remaining = pension - pension_portion;
    let partial = remaining > PENSION_EPSILON;
    let pension_commuted = if partial { pension_portion } else { pension };
    let capital_amount = capital_from_pension(pension_commuted, factor);

    let mut capital = CapitalAsset::new(new_id, fund.client_id, format!("Commutation of {}", fund.name))
        .with_monthly_income(capital_amount)
        .with_tax_treatment(fund.tax_treatment)
        .with_provenance(Provenance::PensionCommutation {
            source_id: fund.id,
            partial,
            original: Box::new(original),
        });
    capital.start_date = fund.pension_start_date;
    capital.indexation = fund.indexation;
    capital.indexation_rate = fund.indexation_rate;

    if partial {
        fund.pension_amount = Some(remaining);
        if fund.balance.is_some() {
            fund.balance = Some(capital_from_pension(remaining, factor));
        }
    } else {
        fund.pension_amount = Some(0.0);
        if fund.balance.is_some() {
            fund.balance = Some(0.0);
        }
        fund.mark_converted(new_id)?;
    }

    Ok(Commutation {
        capital,
        pension_commuted,
        capital_amount,
        partial,
    })
}

/// Rebuild the source fund exactly as it was before a commutation
pub fn reverse_commutation(capital: &CapitalAsset) -> Option<Result<PensionFund>> {
    match &capital.provenance {
        Some(Provenance::PensionCommutation { original, .. }) => Some(original.to_fund()),
        _ => None,
    }
}

/// Move an education fund's whole balance into an exempt capital row
///
/// The fund is zeroed and marked converted; it is never deleted.
pub fn education_to_capital(fund: &mut PensionFund, new_id: HoldingId) -> Result<CapitalAsset> {
    let balance = fund.balance.unwrap_or(0.0);
    if balance < 0.0 {
        return Err(EngineError::InvalidAmount { field: "balance", value: balance });
    }

    let capital = CapitalAsset::new(new_id, fund.client_id, format!("Capital from {}", fund.name))
        .with_monthly_income(balance)
        .with_tax_treatment(TaxTreatment::Exempt)
        .with_provenance(Provenance::EducationConversion { source_id: fund.id });

    fund.balance = Some(0.0);
    fund.pension_amount = Some(0.0);
    fund.mark_converted(new_id)?;
    Ok(capital)
}
