//! Set-wide conversions across all of a client's holdings
//!
//! Each conversion appends one action per row with the pre/post amounts.
//! Every row is validated before the first mutation, so a numeric-policy
//! violation leaves the holdings untouched.

use log::{debug, info};

use crate::action::{ActionLog, ActionType};
use crate::convert::{
    apply_derivation, capital_to_pension, convertible_capital, derive_pension,
    education_to_capital, education_to_pension, PensionDerivation,
};
use crate::error::{EngineError, Result};
use crate::holdings::{is_education_fund, CapitalAsset, ClientId, HoldingState, PensionFund};
use crate::store::HoldingsRepository;

/// Which capital assets a capital-to-pension pass picks up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapitalSelection {
    /// Everything not tax-exempt
    Taxable,
    Exempt,
}

impl CapitalSelection {
    fn matches(&self, asset: &CapitalAsset) -> bool {
        match self {
            CapitalSelection::Taxable => !asset.tax_treatment.is_exempt(),
            CapitalSelection::Exempt => asset.tax_treatment.is_exempt(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConversionService {
    client_id: ClientId,
    pension_coefficient: f64,
}

impl ConversionService {
    pub fn new(client_id: ClientId, pension_coefficient: f64) -> Self {
        Self { client_id, pension_coefficient }
    }

    fn check_coefficient(&self) -> Result<()> {
        if self.pension_coefficient > 0.0 {
            Ok(())
        } else {
            Err(EngineError::InvalidAnnuityFactor {
                holding: "pension coefficient".to_string(),
                factor: self.pension_coefficient,
            })
        }
    }

    /// Active, non-education funds
    fn pension_type_funds<R: HoldingsRepository + ?Sized>(&self, repo: &R) -> Result<Vec<PensionFund>> {
        Ok(repo
            .pension_funds(self.client_id)?
            .into_iter()
            .filter(|f| f.state == HoldingState::Active && !is_education_fund(f))
            .collect())
    }

    fn education_funds<R: HoldingsRepository + ?Sized>(&self, repo: &R) -> Result<Vec<PensionFund>> {
        Ok(repo
            .pension_funds(self.client_id)?
            .into_iter()
            .filter(|f| f.state == HoldingState::Active && is_education_fund(f))
            .collect())
    }

    /// Derive each pension-type fund's pension from its balance when absent
    ///
    /// Funds that already carry a pension are logged as "use existing" and
    /// left unchanged, so a second run is a no-op.
    pub fn convert_all_pension_to_pension<R: HoldingsRepository + ?Sized>(
        &self,
        repo: &mut R,
        log: &mut ActionLog,
    ) -> Result<()> {
        let funds = self.pension_type_funds(repo)?;
        let derivations = funds
            .iter()
            .map(derive_pension)
            .collect::<Result<Vec<_>>>()?;

        for (mut fund, derivation) in funds.into_iter().zip(derivations) {
            match derivation {
                PensionDerivation::UseExisting(pension) => {
                    log.record(
                        ActionType::PensionToPension,
                        format!("use existing pension {:.2}", pension),
                        fund.label(),
                        fund.label(),
                        pension,
                    );
                }
                PensionDerivation::Derived { balance, pension } => {
                    apply_derivation(&mut fund, derivation)?;
                    repo.update_pension_fund(&fund)?;
                    log.record(
                        ActionType::PensionToPension,
                        format!("balance {:.2} -> pension {:.2}", balance, pension),
                        fund.label(),
                        fund.label(),
                        pension,
                    );
                }
                PensionDerivation::NoBalance => {
                    debug!("{}: no balance or pension, skipped", fund.label());
                }
            }
        }
        Ok(())
    }

    /// Replace taxable capital assets with equivalent pension rows
    pub fn convert_taxable_capital_to_pension<R: HoldingsRepository + ?Sized>(
        &self,
        repo: &mut R,
        log: &mut ActionLog,
    ) -> Result<()> {
        self.convert_capital_to_pension(repo, log, CapitalSelection::Taxable)
    }

    /// Replace exempt capital assets with exempt pension rows
    pub fn convert_exempt_capital_to_pension<R: HoldingsRepository + ?Sized>(
        &self,
        repo: &mut R,
        log: &mut ActionLog,
    ) -> Result<()> {
        self.convert_capital_to_pension(repo, log, CapitalSelection::Exempt)
    }

    fn convert_capital_to_pension<R: HoldingsRepository + ?Sized>(
        &self,
        repo: &mut R,
        log: &mut ActionLog,
        selection: CapitalSelection,
    ) -> Result<()> {
        self.check_coefficient()?;
        let assets: Vec<CapitalAsset> = repo
            .capital_assets(self.client_id)?
            .into_iter()
            .filter(|a| selection.matches(a))
            .collect();

        for asset in assets {
            let fund = capital_to_pension(&asset, repo.next_id(), self.pension_coefficient)?;
            let pension = fund.monthly_pension();
            log.record(
                ActionType::CapitalToPension,
                format!(
                    "capital {:.2} / {} -> pension {:.2} ({:?})",
                    convertible_capital(&asset),
                    self.pension_coefficient,
                    pension,
                    fund.tax_treatment
                ),
                asset.label(),
                fund.label(),
                pension,
            );
            repo.delete_capital_asset(asset.id)?;
            repo.insert_pension_fund(fund)?;
        }
        info!("client {}: converted {:?} capital to pension", self.client_id, selection);
        Ok(())
    }

    /// Annuitize education funds as exempt pensions
    pub fn convert_education_funds_to_pension<R: HoldingsRepository + ?Sized>(
        &self,
        repo: &mut R,
        log: &mut ActionLog,
    ) -> Result<()> {
        self.check_coefficient()?;
        for mut fund in self.education_funds(repo)? {
            let balance = fund.balance.unwrap_or(0.0);
            let pension = education_to_pension(&mut fund, self.pension_coefficient)?;
            repo.update_pension_fund(&fund)?;
            log.record(
                ActionType::EducationToPension,
                format!("education balance {:.2} -> exempt pension {:.2}", balance, pension),
                fund.label(),
                fund.label(),
                pension,
            );
        }
        Ok(())
    }

    /// Move education fund balances into exempt capital
    pub fn convert_education_funds_to_capital<R: HoldingsRepository + ?Sized>(
        &self,
        repo: &mut R,
        log: &mut ActionLog,
    ) -> Result<()> {
        for mut fund in self.education_funds(repo)? {
            let balance = fund.balance.unwrap_or(0.0);
            let capital = education_to_capital(&mut fund, repo.next_id())?;
            log.record(
                ActionType::EducationToCapital,
                format!("education balance {:.2} -> exempt capital {:.2}", balance, capital.monthly_income),
                fund.label(),
                capital.label(),
                capital.monthly_income,
            );
            repo.update_pension_fund(&fund)?;
            repo.insert_capital_asset(capital)?;
        }
        Ok(())
    }
}
