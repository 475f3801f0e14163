//! Allocation of the remaining tax-exempt capital allowance across
//! scenario-generated commutations
//!
//! Smallest commutations are covered first, each all-or-nothing; allocation
//! stops at the first row the remaining allowance cannot fully cover.

use log::{info, warn};
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::holdings::{CapitalAsset, ClientId, FixationRecord, HoldingId, TaxTreatment};
use crate::store::HoldingsRepository;

/// What the allocation changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExemptionOutcome {
    /// Capital rows moved to exempt treatment, in allocation order
    pub exempted: Vec<HoldingId>,
    pub used: f64,
    pub remaining: f64,
}

/// Allocation computed before any row is written
#[derive(Debug, Clone, PartialEq)]
pub struct ExemptionPlan {
    fixation: FixationRecord,
    /// Rows already switched to exempt, ready to write
    pub rows: Vec<CapitalAsset>,
    pub used: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct CommutationExemptionService {
    client_id: ClientId,
}

impl CommutationExemptionService {
    pub fn new(client_id: ClientId) -> Self {
        Self { client_id }
    }

    /// Taxable capital produced by commuting a pension in a scenario
    fn taxable_commutations<R: HoldingsRepository + ?Sized>(&self, repo: &R) -> Result<Vec<CapitalAsset>> {
        let mut rows: Vec<CapitalAsset> = repo
            .capital_assets(self.client_id)?
            .into_iter()
            .filter(|a| a.is_scenario_commutation() && a.tax_treatment == TaxTreatment::Taxable)
            .collect();
        rows.sort_by(|a, b| a.monthly_income.total_cmp(&b.monthly_income).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    /// Work out which commutations the allowance covers without writing
    /// anything
    pub fn plan<R: HoldingsRepository + ?Sized>(&self, repo: &R) -> Result<ExemptionPlan> {
        let fixation = repo
            .fixation_record(self.client_id)?
            .ok_or(EngineError::FixationRecordNotFound(self.client_id))?;

        let mut remaining = fixation.exempt_capital_remaining.max(0.0);
        let mut used = 0.0;
        let mut rows = Vec::new();

        for mut row in self.taxable_commutations(repo)? {
            let amount = row.monthly_income;
            if amount > remaining {
                warn!(
                    "{}: {:.2} exceeds remaining exemption {:.2}, stays taxable",
                    row.label(),
                    amount,
                    remaining
                );
                break;
            }
            row.tax_treatment = TaxTreatment::Exempt;
            remaining -= amount;
            used += amount;
            rows.push(row);
        }

        Ok(ExemptionPlan { fixation, rows, used, remaining })
    }

    /// Reassign commutations to exempt while the allowance covers them and
    /// persist the remaining/used allowance onto the fixation record
    ///
    /// The allocation is planned in full before the first write. A repository
    /// failure while writing can still leave earlier rows updated; callers
    /// persisting to a real store must run this inside a transaction and roll
    /// it back on error.
    pub fn apply<R: HoldingsRepository + ?Sized>(&self, repo: &mut R) -> Result<ExemptionOutcome> {
        let ExemptionPlan { mut fixation, rows, used, remaining } = self.plan(&*repo)?;

        for row in &rows {
            repo.update_capital_asset(row)?;
        }
        fixation.exempt_capital_remaining = remaining;
        fixation.exempt_capital_used += used;
        repo.save_fixation_record(fixation)?;

        let outcome = ExemptionOutcome { exempted: rows.iter().map(|r| r.id).collect(), used, remaining };
        info!(
            "client {}: exempted {} commutations, used {:.2}, remaining {:.2}",
            self.client_id,
            outcome.exempted.len(),
            outcome.used,
            outcome.remaining
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::PensionFundRecord;
    use crate::holdings::{PensionFund, Provenance};
    use crate::store::InMemoryRepository;
    use crate::testing::sample_repository;

    fn commutation(id: HoldingId, amount: f64) -> CapitalAsset {
        let source = PensionFund::new(1, 1, "Fund A").with_pension(3_000.0, 150.0);
        CapitalAsset::new(id, 1, format!("Commutation {}", id))
            .with_monthly_income(amount)
            .with_provenance(Provenance::PensionCommutation {
                source_id: 1,
                partial: true,
                original: Box::new(PensionFundRecord::from(&source)),
            })
    }

    #[test]
    fn test_smallest_first_all_or_nothing() {
        let mut repo = sample_repository();
        repo.insert_capital_asset(commutation(30, 200_000.0)).unwrap();
        repo.insert_capital_asset(commutation(31, 50_000.0)).unwrap();
        repo.insert_capital_asset(commutation(32, 120_000.0)).unwrap();

        let outcome = CommutationExemptionService::new(1).apply(&mut repo).unwrap();

        // 50k + 120k fit in 300k; 200k does not fit the remaining 130k
        assert_eq!(outcome.exempted, vec![31, 32]);
        assert_eq!(outcome.used, 170_000.0);
        assert_eq!(outcome.remaining, 130_000.0);

        let fixation = repo.fixation_record(1).unwrap().unwrap();
        assert_eq!(fixation.exempt_capital_remaining, 130_000.0);
        assert_eq!(fixation.exempt_capital_used, 170_000.0);

        let big = repo.capital_assets(1).unwrap().into_iter().find(|a| a.id == 30).unwrap();
        assert_eq!(big.tax_treatment, TaxTreatment::Taxable);
    }

    #[test]
    fn test_plan_writes_nothing() {
        let mut repo = sample_repository();
        repo.insert_capital_asset(commutation(30, 200_000.0)).unwrap();
        repo.insert_capital_asset(commutation(31, 50_000.0)).unwrap();
        let before = repo.capital_assets(1).unwrap();

        let plan = CommutationExemptionService::new(1).plan(&repo).unwrap();

        // 50k then 200k both fit in 300k
        assert_eq!(plan.rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![31, 30]);
        assert!(plan.rows.iter().all(|r| r.tax_treatment == TaxTreatment::Exempt));
        assert_eq!(plan.used, 250_000.0);
        assert_eq!(plan.remaining, 50_000.0);
        assert_eq!(repo.capital_assets(1).unwrap(), before);
        assert_eq!(repo.fixation_record(1).unwrap().unwrap().exempt_capital_remaining, 300_000.0);
    }

    #[test]
    fn test_ignores_non_commutation_capital() {
        let mut repo = sample_repository();
        let outcome = CommutationExemptionService::new(1).apply(&mut repo).unwrap();
        assert!(outcome.exempted.is_empty());
        let savings = repo.capital_assets(1).unwrap().into_iter().find(|a| a.id == 4).unwrap();
        assert_eq!(savings.tax_treatment, TaxTreatment::Taxable);
    }

    #[test]
    fn test_requires_fixation_record() {
        let mut repo = InMemoryRepository::new();
        let err = CommutationExemptionService::new(1).apply(&mut repo).unwrap_err();
        assert!(matches!(err, EngineError::FixationRecordNotFound(1)));
    }
}
