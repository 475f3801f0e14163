//! Snapshot and restore of a client's full holdings set
//!
//! `restore` is destructive and total: every current row of the four
//! snapshotted kinds is deleted and the snapshot rows are re-inserted.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::convert::{
    AdditionalIncomeRecord, CapitalAssetRecord, PensionFundRecord, TerminationEventRecord,
};
use crate::error::Result;
use crate::holdings::ClientId;
use crate::store::HoldingsRepository;

/// Serialized holdings of one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsSnapshot {
    pub client_id: ClientId,
    pub pension_funds: Vec<PensionFundRecord>,
    pub capital_assets: Vec<CapitalAssetRecord>,
    pub additional_incomes: Vec<AdditionalIncomeRecord>,
    pub termination_events: Vec<TerminationEventRecord>,
}

impl HoldingsSnapshot {
    pub fn row_count(&self) -> usize {
        self.pension_funds.len()
            + self.capital_assets.len()
            + self.additional_incomes.len()
            + self.termination_events.len()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StateService {
    client_id: ClientId,
}

impl StateService {
    pub fn new(client_id: ClientId) -> Self {
        Self { client_id }
    }

    /// Read all holdings into a persistence-independent snapshot
    pub fn save<R: HoldingsRepository + ?Sized>(&self, repo: &R) -> Result<HoldingsSnapshot> {
        let snapshot = HoldingsSnapshot {
            client_id: self.client_id,
            pension_funds: repo
                .pension_funds(self.client_id)?
                .iter()
                .map(PensionFundRecord::from)
                .collect(),
            capital_assets: repo
                .capital_assets(self.client_id)?
                .iter()
                .map(CapitalAssetRecord::from)
                .collect(),
            additional_incomes: repo
                .additional_incomes(self.client_id)?
                .iter()
                .map(AdditionalIncomeRecord::from)
                .collect(),
            termination_events: repo
                .termination_events(self.client_id)?
                .iter()
                .map(TerminationEventRecord::from)
                .collect(),
        };
        debug!("client {}: saved snapshot of {} rows", self.client_id, snapshot.row_count());
        Ok(snapshot)
    }

    /// Replace the client's holdings with the snapshot contents
    pub fn restore<R: HoldingsRepository + ?Sized>(
        &self,
        repo: &mut R,
        snapshot: &HoldingsSnapshot,
    ) -> Result<()> {
        // Rebuild every row first so a bad record fails before anything is deleted
        let funds = snapshot
            .pension_funds
            .iter()
            .map(PensionFundRecord::to_fund)
            .collect::<Result<Vec<_>>>()?;
        let assets = snapshot
            .capital_assets
            .iter()
            .map(CapitalAssetRecord::to_asset)
            .collect::<Result<Vec<_>>>()?;
        let incomes = snapshot
            .additional_incomes
            .iter()
            .map(AdditionalIncomeRecord::to_income)
            .collect::<Result<Vec<_>>>()?;
        let events = snapshot
            .termination_events
            .iter()
            .map(TerminationEventRecord::to_event)
            .collect::<Result<Vec<_>>>()?;

        for fund in repo.pension_funds(self.client_id)? {
            repo.delete_pension_fund(fund.id)?;
        }
        for asset in repo.capital_assets(self.client_id)? {
            repo.delete_capital_asset(asset.id)?;
        }
        for income in repo.additional_incomes(self.client_id)? {
            repo.delete_additional_income(income.id)?;
        }
        for event in repo.termination_events(self.client_id)? {
            repo.delete_termination_event(event.id)?;
        }

        for fund in funds {
            repo.insert_pension_fund(fund)?;
        }
        for asset in assets {
            repo.insert_capital_asset(asset)?;
        }
        for income in incomes {
            repo.insert_additional_income(income)?;
        }
        for event in events {
            repo.insert_termination_event(event)?;
        }

        debug!("client {}: restored snapshot of {} rows", self.client_id, snapshot.row_count());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRepository;
    use crate::testing::sample_repository;

    #[test]
    fn test_restore_of_save_is_identity() {
        let mut repo = sample_repository();
        let before_funds = repo.pension_funds(1).unwrap();
        let before_assets = repo.capital_assets(1).unwrap();
        let before_incomes = repo.additional_incomes(1).unwrap();
        let before_events = repo.termination_events(1).unwrap();

        let service = StateService::new(1);
        let snapshot = service.save(&repo).unwrap();
        service.restore(&mut repo, &snapshot).unwrap();

        assert_eq!(repo.pension_funds(1).unwrap(), before_funds);
        assert_eq!(repo.capital_assets(1).unwrap(), before_assets);
        assert_eq!(repo.additional_incomes(1).unwrap(), before_incomes);
        assert_eq!(repo.termination_events(1).unwrap(), before_events);
    }

    #[test]
    fn test_restore_discards_later_rows() {
        let mut repo = sample_repository();
        let service = StateService::new(1);
        let snapshot = service.save(&repo).unwrap();

        let id = repo.next_id();
        repo.insert_capital_asset(crate::holdings::CapitalAsset::new(id, 1, "Scratch"))
            .unwrap();
        let fund_id = repo.pension_funds(1).unwrap()[0].id;
        repo.delete_pension_fund(fund_id).unwrap();

        service.restore(&mut repo, &snapshot).unwrap();
        assert_eq!(service.save(&repo).unwrap(), snapshot);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let repo = sample_repository();
        let snapshot = StateService::new(1).save(&repo).unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: HoldingsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_empty_client_round_trips() {
        let mut repo = InMemoryRepository::new();
        let service = StateService::new(9);
        let snapshot = service.save(&repo).unwrap();
        assert_eq!(snapshot.row_count(), 0);
        service.restore(&mut repo, &snapshot).unwrap();
    }
}
