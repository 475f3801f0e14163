//! Policy-driven handling of a termination (severance) event
//!
//! The event itself is never mutated; each strategy only chooses what happens
//! to its exempt and taxable portions.

use log::info;
use serde::{Deserialize, Serialize};

use crate::action::{ActionLog, ActionType};
use crate::calc::pension_from_capital;
use crate::error::{EngineError, Result};
use crate::holdings::{
    CapitalAsset, ClientId, ConversionSource, FundCategory, PensionFund, Provenance, TaxTreatment,
    TerminationEvent,
};
use crate::store::HoldingsRepository;

/// What to do with one portion of a termination grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationChoice {
    /// Route into a monthly pension
    Annuity,
    /// Take as cash using the tax exemption
    RedeemWithExemption,
    /// Take as cash, fully taxed
    RedeemNoExemption,
}

/// Choices for the exempt and taxable portions respectively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationPolicy {
    pub exempt: TerminationChoice,
    pub taxable: TerminationChoice,
}

impl TerminationPolicy {
    pub const fn new(exempt: TerminationChoice, taxable: TerminationChoice) -> Self {
        Self { exempt, taxable }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Portion {
    Exempt,
    Taxable,
}

impl Portion {
    fn label(&self) -> &'static str {
        match self {
            Portion::Exempt => "exempt",
            Portion::Taxable => "taxable",
        }
    }

    fn tax_treatment(&self) -> TaxTreatment {
        match self {
            Portion::Exempt => TaxTreatment::Exempt,
            Portion::Taxable => TaxTreatment::Taxable,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TerminationService {
    client_id: ClientId,
    pension_coefficient: f64,
}

impl TerminationService {
    pub fn new(client_id: ClientId, pension_coefficient: f64) -> Self {
        Self { client_id, pension_coefficient }
    }

    /// Apply `policy` to every termination event of the client
    pub fn handle_all<R: HoldingsRepository + ?Sized>(
        &self,
        repo: &mut R,
        policy: TerminationPolicy,
        log: &mut ActionLog,
    ) -> Result<()> {
        for event in repo.termination_events(self.client_id)? {
            self.handle(repo, &event, policy, log)?;
        }
        Ok(())
    }

    /// Apply `policy` to one event
    pub fn handle<R: HoldingsRepository + ?Sized>(
        &self,
        repo: &mut R,
        event: &TerminationEvent,
        policy: TerminationPolicy,
        log: &mut ActionLog,
    ) -> Result<()> {
        if event.exempt_amount < 0.0 || event.taxable_amount < 0.0 {
            return Err(EngineError::InvalidAmount {
                field: "termination amount",
                value: event.exempt_amount.min(event.taxable_amount),
            });
        }
        self.apply_portion(repo, event, Portion::Exempt, event.exempt_amount, policy.exempt, log)?;
        self.apply_portion(repo, event, Portion::Taxable, event.taxable_amount, policy.taxable, log)?;
        info!(
            "client {}: termination {} of {:.2} handled ({:?}/{:?})",
            self.client_id,
            event.id,
            event.total_amount(),
            policy.exempt,
            policy.taxable
        );
        Ok(())
    }

    fn apply_portion<R: HoldingsRepository + ?Sized>(
        &self,
        repo: &mut R,
        event: &TerminationEvent,
        portion: Portion,
        amount: f64,
        choice: TerminationChoice,
        log: &mut ActionLog,
    ) -> Result<()> {
        if amount <= 0.0 {
            return Ok(());
        }
        let from = format!("{} termination grant ({})", event.employer_name, portion.label());
        let provenance = Provenance::ScenarioConversion {
            source: ConversionSource::Termination,
            source_id: event.id,
        };

        match choice {
            TerminationChoice::Annuity => {
                let pension = pension_from_capital(&from, amount, self.pension_coefficient)?;
                let mut fund = PensionFund::new(
                    repo.next_id(),
                    self.client_id,
                    format!("Severance pension - {}", event.employer_name),
                )
                .with_category(FundCategory::Other)
                .with_tax_treatment(portion.tax_treatment())
                .with_provenance(provenance);
                fund.balance = Some(amount);
                fund.annuity_factor = Some(self.pension_coefficient);
                fund.pension_amount = Some(pension);
                fund.pension_start_date = event.termination_date;

                log.record(
                    ActionType::TerminationToPension,
                    format!("{:.2} -> pension {:.2}", amount, pension),
                    from,
                    fund.label(),
                    pension,
                );
                repo.insert_pension_fund(fund)?;
            }
            TerminationChoice::RedeemWithExemption | TerminationChoice::RedeemNoExemption => {
                let tax_treatment = if choice == TerminationChoice::RedeemWithExemption {
                    TaxTreatment::Exempt
                } else {
                    TaxTreatment::Taxable
                };
                let mut asset = CapitalAsset::new(
                    repo.next_id(),
                    self.client_id,
                    format!("Severance redemption - {}", event.employer_name),
                )
                .with_current_value(amount)
                .with_tax_treatment(tax_treatment)
                .with_provenance(provenance);
                asset.start_date = event.termination_date;

                log.record(
                    ActionType::TerminationToCapital,
                    format!("{:.2} redeemed as {:?} capital", amount, tax_treatment),
                    from,
                    asset.label(),
                    amount,
                );
                repo.insert_capital_asset(asset)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_repository;

    #[test]
    fn test_both_portions_to_annuity() {
        let mut repo = sample_repository();
        let mut log = ActionLog::new();
        let policy = TerminationPolicy::new(TerminationChoice::Annuity, TerminationChoice::Annuity);
        TerminationService::new(1, 200.0).handle_all(&mut repo, policy, &mut log).unwrap();

        let created: Vec<_> = repo
            .pension_funds(1)
            .unwrap()
            .into_iter()
            .filter(|f| f.name.starts_with("Severance pension"))
            .collect();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].pension_amount, Some(250.0));
        assert_eq!(created[0].tax_treatment, TaxTreatment::Exempt);
        assert_eq!(created[1].pension_amount, Some(400.0));
        assert_eq!(created[1].tax_treatment, TaxTreatment::Taxable);

        // The event itself is unchanged and fully annuitized
        let events = repo.termination_events(1).unwrap();
        assert_eq!(events[0].exempt_amount, 50_000.0);
        let annuitized: f64 = created.iter().map(|f| f.monthly_pension()).sum();
        assert_eq!(annuitized * 200.0, events[0].total_amount());
    }

    #[test]
    fn test_split_policy() {
        let mut repo = sample_repository();
        let mut log = ActionLog::new();
        let policy = TerminationPolicy::new(
            TerminationChoice::RedeemWithExemption,
            TerminationChoice::Annuity,
        );
        TerminationService::new(1, 200.0).handle_all(&mut repo, policy, &mut log).unwrap();

        let redeemed: Vec<_> = repo
            .capital_assets(1)
            .unwrap()
            .into_iter()
            .filter(|a| a.name.starts_with("Severance redemption"))
            .collect();
        assert_eq!(redeemed.len(), 1);
        assert_eq!(redeemed[0].current_value, 50_000.0);
        assert_eq!(redeemed[0].tax_treatment, TaxTreatment::Exempt);
        assert_eq!(log.of_type(ActionType::TerminationToPension).count(), 1);
        assert_eq!(log.of_type(ActionType::TerminationToCapital).count(), 1);
    }
}
