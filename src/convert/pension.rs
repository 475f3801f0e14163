//! Transforms that produce or update pension rows

use log::debug;

use crate::calc::{pension_from_balance, pension_from_capital};
use crate::error::Result;
use crate::holdings::{
    CapitalAsset, ConversionSource, FundCategory, HoldingId, InputMode, PensionFund, Provenance,
    TaxTreatment,
};

/// Outcome of deriving a fund's monthly pension
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PensionDerivation {
    /// Pension already set; nothing changes
    UseExisting(f64),
    /// Pension computed from balance / annuity factor
    Derived { balance: f64, pension: f64 },
    /// Neither pension nor balance present
    NoBalance,
}

/// Work out a fund's pension without mutating it
///
/// A balance with an absent or non-positive annuity factor is rejected.
pub fn derive_pension(fund: &PensionFund) -> Result<PensionDerivation> {
    if let Some(pension) = fund.pension_amount {
        return Ok(PensionDerivation::UseExisting(pension));
    }
    match fund.balance {
        Some(balance) => {
            let factor = fund.required_annuity_factor()?;
            let pension = pension_from_balance(&fund.label(), balance, factor)?;
            Ok(PensionDerivation::Derived { balance, pension })
        }
        None => Ok(PensionDerivation::NoBalance),
    }
}

/// Apply a derivation computed by [`derive_pension`]
pub fn apply_derivation(fund: &mut PensionFund, derivation: PensionDerivation) -> Result<()> {
    if let PensionDerivation::Derived { pension, .. } = derivation {
        fund.pension_amount = Some(pension);
        fund.input_mode = InputMode::Calculated;
        if pension == 0.0 {
            fund.mark_zeroed()?;
        }
        debug!("{}: derived pension {:.2}", fund.label(), pension);
    }
    Ok(())
}

/// Capital amount a capital asset contributes when annuitized
pub fn convertible_capital(asset: &CapitalAsset) -> f64 {
    asset.monthly_income + asset.current_value
}

/// Build the pension row replacing a capital asset
///
/// Pension = capital / coefficient; tax treatment and indexation carry over.
pub fn capital_to_pension(
    asset: &CapitalAsset,
    new_id: HoldingId,
    pension_coefficient: f64,
) -> Result<PensionFund> {
    let capital = convertible_capital(asset);
    let pension = pension_from_capital(&asset.label(), capital, pension_coefficient)?;

    let mut fund = PensionFund::new(new_id, asset.client_id, format!("Pension from {}", asset.name))
        .with_category(FundCategory::Other)
        .with_tax_treatment(asset.tax_treatment)
        .with_provenance(Provenance::ScenarioConversion {
            source: ConversionSource::Capital,
            source_id: asset.id,
        });
    fund.balance = Some(capital);
    fund.annuity_factor = Some(pension_coefficient);
    fund.pension_amount = Some(pension);
    fund.pension_start_date = asset.start_date;
    fund.indexation = asset.indexation;
    fund.indexation_rate = asset.indexation_rate;
    Ok(fund)
}

/// Annuitize an education fund in place as an exempt pension
///
/// Returns the pension amount. The balance is always treated as capital.
pub fn education_to_pension(fund: &mut PensionFund, pension_coefficient: f64) -> Result<f64> {
    let balance = fund.balance.unwrap_or(0.0);
    let pension = pension_from_capital(&fund.label(), balance, pension_coefficient)?;
    fund.annuity_factor = Some(pension_coefficient);
    fund.pension_amount = Some(pension);
    fund.input_mode = InputMode::Calculated;
    fund.tax_treatment = TaxTreatment::Exempt;
    fund.provenance = Some(Provenance::EducationConversion { source_id: fund.id });
    Ok(pension)
}
