//! BTreeMap-backed repository with deterministic iteration order

use std::collections::BTreeMap;

use super::HoldingsRepository;
use crate::error::{EngineError, Result, RowKind};
use crate::holdings::{
    load_pension_funds_from_reader, AdditionalIncome, CapitalAsset, Client, ClientBundle, ClientId,
    FixationRecord, HoldingId, PensionFund, TerminationEvent,
};

#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    clients: BTreeMap<ClientId, Client>,
    pension_funds: BTreeMap<HoldingId, PensionFund>,
    capital_assets: BTreeMap<HoldingId, CapitalAsset>,
    additional_incomes: BTreeMap<HoldingId, AdditionalIncome>,
    termination_events: BTreeMap<HoldingId, TerminationEvent>,
    fixations: BTreeMap<ClientId, FixationRecord>,
    next_id: HoldingId,
}

fn insert_unique<T>(
    map: &mut BTreeMap<HoldingId, T>,
    kind: RowKind,
    id: HoldingId,
    row: T,
) -> Result<()> {
    if map.contains_key(&id) {
        return Err(EngineError::DuplicateId { kind, id });
    }
    map.insert(id, row);
    Ok(())
}

fn remove_existing<T>(map: &mut BTreeMap<HoldingId, T>, kind: RowKind, id: HoldingId) -> Result<()> {
    map.remove(&id).map(|_| ()).ok_or(EngineError::NotFound { kind, id })
}

fn rows_for<T: Clone>(
    map: &BTreeMap<HoldingId, T>,
    client_id: ClientId,
    owner: impl Fn(&T) -> ClientId,
) -> Vec<T> {
    map.values().filter(|row| owner(row) == client_id).cloned().collect()
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self { next_id: 1, ..Default::default() }
    }

    pub fn add_client(&mut self, client: Client) {
        self.clients.insert(client.id, client);
    }

    /// Build a repository holding one client's bundle
    pub fn from_bundle(bundle: &ClientBundle) -> Result<Self> {
        let mut repo = Self::new();
        repo.add_client(bundle.client.clone());
        for fund in &bundle.pension_funds {
            fund.validate()?;
            repo.insert_pension_fund(fund.clone())?;
        }
        for asset in &bundle.capital_assets {
            repo.insert_capital_asset(asset.clone())?;
        }
        for income in &bundle.additional_incomes {
            repo.insert_additional_income(income.clone())?;
        }
        for event in &bundle.termination_events {
            repo.insert_termination_event(event.clone())?;
        }
        if let Some(fixation) = &bundle.fixation {
            repo.save_fixation_record(fixation.clone())?;
        }
        Ok(repo)
    }

    /// Add the pension funds of a CSV statement export to `client_id`
    ///
    /// Rows take fresh ids; nothing is inserted when any row fails to parse.
    pub fn load_funds_csv<R: std::io::Read>(&mut self, reader: R, client_id: ClientId) -> Result<usize> {
        let funds = load_pension_funds_from_reader(reader, client_id, self.next_id.max(1))?;
        let count = funds.len();
        for fund in funds {
            self.insert_pension_fund(fund)?;
        }
        Ok(count)
    }

    /// Keep freshly allocated ids clear of explicitly inserted ones
    fn observe_id(&mut self, id: HoldingId) {
        if id >= self.next_id {
            self.next_id = id + 1;
        }
    }
}

impl HoldingsRepository for InMemoryRepository {
    fn client(&self, client_id: ClientId) -> Result<Client> {
        self.clients
            .get(&client_id)
            .cloned()
            .ok_or(EngineError::ClientNotFound(client_id))
    }

    fn pension_funds(&self, client_id: ClientId) -> Result<Vec<PensionFund>> {
        Ok(rows_for(&self.pension_funds, client_id, |f| f.client_id))
    }

    fn capital_assets(&self, client_id: ClientId) -> Result<Vec<CapitalAsset>> {
        Ok(rows_for(&self.capital_assets, client_id, |a| a.client_id))
    }

    fn additional_incomes(&self, client_id: ClientId) -> Result<Vec<AdditionalIncome>> {
        Ok(rows_for(&self.additional_incomes, client_id, |i| i.client_id))
    }

    fn termination_events(&self, client_id: ClientId) -> Result<Vec<TerminationEvent>> {
        Ok(rows_for(&self.termination_events, client_id, |e| e.client_id))
    }

    fn insert_pension_fund(&mut self, fund: PensionFund) -> Result<()> {
        self.observe_id(fund.id);
        insert_unique(&mut self.pension_funds, RowKind::PensionFund, fund.id, fund)
    }

    fn update_pension_fund(&mut self, fund: &PensionFund) -> Result<()> {
        match self.pension_funds.get_mut(&fund.id) {
            Some(existing) => {
                *existing = fund.clone();
                Ok(())
            }
            None => Err(EngineError::NotFound { kind: RowKind::PensionFund, id: fund.id }),
        }
    }

    fn delete_pension_fund(&mut self, id: HoldingId) -> Result<()> {
        remove_existing(&mut self.pension_funds, RowKind::PensionFund, id)
    }

    fn insert_capital_asset(&mut self, asset: CapitalAsset) -> Result<()> {
        self.observe_id(asset.id);
        insert_unique(&mut self.capital_assets, RowKind::CapitalAsset, asset.id, asset)
    }

    fn update_capital_asset(&mut self, asset: &CapitalAsset) -> Result<()> {
        match self.capital_assets.get_mut(&asset.id) {
            Some(existing) => {
                *existing = asset.clone();
                Ok(())
            }
            None => Err(EngineError::NotFound { kind: RowKind::CapitalAsset, id: asset.id }),
        }
    }

    fn delete_capital_asset(&mut self, id: HoldingId) -> Result<()> {
        remove_existing(&mut self.capital_assets, RowKind::CapitalAsset, id)
    }

    fn insert_additional_income(&mut self, income: AdditionalIncome) -> Result<()> {
        self.observe_id(income.id);
        insert_unique(&mut self.additional_incomes, RowKind::AdditionalIncome, income.id, income)
    }

    fn delete_additional_income(&mut self, id: HoldingId) -> Result<()> {
        remove_existing(&mut self.additional_incomes, RowKind::AdditionalIncome, id)
    }

    fn insert_termination_event(&mut self, event: TerminationEvent) -> Result<()> {
        self.observe_id(event.id);
        insert_unique(&mut self.termination_events, RowKind::TerminationEvent, event.id, event)
    }

    fn delete_termination_event(&mut self, id: HoldingId) -> Result<()> {
        remove_existing(&mut self.termination_events, RowKind::TerminationEvent, id)
    }

    fn fixation_record(&self, client_id: ClientId) -> Result<Option<FixationRecord>> {
        Ok(self.fixations.get(&client_id).cloned())
    }

    fn save_fixation_record(&mut self, record: FixationRecord) -> Result<()> {
        self.fixations.insert(record.client_id, record);
        Ok(())
    }

    fn next_id(&mut self) -> HoldingId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut repo = InMemoryRepository::new();
        repo.insert_pension_fund(PensionFund::new(3, 1, "A")).unwrap();
        let err = repo.insert_pension_fund(PensionFund::new(3, 1, "B")).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateId { kind: RowKind::PensionFund, id: 3 }));
    }

    #[test]
    fn test_next_id_skips_inserted_ids() {
        let mut repo = InMemoryRepository::new();
        repo.insert_capital_asset(CapitalAsset::new(41, 1, "Cash")).unwrap();
        assert_eq!(repo.next_id(), 42);
        assert_eq!(repo.next_id(), 43);
    }

    #[test]
    fn test_rows_filtered_by_client() {
        let mut repo = InMemoryRepository::new();
        repo.insert_pension_fund(PensionFund::new(1, 1, "Mine")).unwrap();
        repo.insert_pension_fund(PensionFund::new(2, 2, "Theirs")).unwrap();
        let funds = repo.pension_funds(1).unwrap();
        assert_eq!(funds.len(), 1);
        assert_eq!(funds[0].name, "Mine");
    }

    #[test]
    fn test_csv_funds_take_fresh_ids() {
        let mut repo = InMemoryRepository::new();
        repo.insert_pension_fund(PensionFund::new(5, 1, "Existing")).unwrap();
        let statement = "\
Name,Category,Balance,AnnuityFactor,PensionAmount,TaxTreatment,Indexation,IndexationRate,PensionStartDate
Central Pension,Pension,1000000,200,,Taxable,Cpi,,
Old Policy,Insurance,,150,3000,Taxable,None,,
";
        assert_eq!(repo.load_funds_csv(statement.as_bytes(), 1).unwrap(), 2);

        let ids: Vec<_> = repo.pension_funds(1).unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![5, 6, 7]);
        assert_eq!(repo.next_id(), 8);
    }

    #[test]
    fn test_bad_csv_inserts_nothing() {
        let mut repo = InMemoryRepository::new();
        let statement = "\
Name,Category,Balance,AnnuityFactor,PensionAmount,TaxTreatment,Indexation,IndexationRate,PensionStartDate
Good,Pension,1000,200,,Taxable,None,,
Bad,Pension,1000,200,,Taxable,Fixed,,
";
        assert!(repo.load_funds_csv(statement.as_bytes(), 1).is_err());
        assert!(repo.pension_funds(1).unwrap().is_empty());
    }

    #[test]
    fn test_missing_client() {
        let repo = InMemoryRepository::new();
        assert!(matches!(repo.client(5), Err(EngineError::ClientNotFound(5))));
    }
}
