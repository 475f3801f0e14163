//! Persistence seam
//!
//! Services exchange plain holding rows through [`HoldingsRepository`]. The
//! caller owns the transaction boundary; nothing here locks or retries.

mod memory;

pub use memory::InMemoryRepository;

use crate::error::Result;
use crate::holdings::{
    AdditionalIncome, CapitalAsset, Client, ClientId, FixationRecord, HoldingId, PensionFund,
    TerminationEvent,
};

/// Storage for a client's holdings
pub trait HoldingsRepository {
    /// Fetch the client record
    fn client(&self, client_id: ClientId) -> Result<Client>;

    fn pension_funds(&self, client_id: ClientId) -> Result<Vec<PensionFund>>;
    fn capital_assets(&self, client_id: ClientId) -> Result<Vec<CapitalAsset>>;
    fn additional_incomes(&self, client_id: ClientId) -> Result<Vec<AdditionalIncome>>;
    fn termination_events(&self, client_id: ClientId) -> Result<Vec<TerminationEvent>>;

    fn insert_pension_fund(&mut self, fund: PensionFund) -> Result<()>;
    fn update_pension_fund(&mut self, fund: &PensionFund) -> Result<()>;
    fn delete_pension_fund(&mut self, id: HoldingId) -> Result<()>;

    fn insert_capital_asset(&mut self, asset: CapitalAsset) -> Result<()>;
    fn update_capital_asset(&mut self, asset: &CapitalAsset) -> Result<()>;
    fn delete_capital_asset(&mut self, id: HoldingId) -> Result<()>;

    fn insert_additional_income(&mut self, income: AdditionalIncome) -> Result<()>;
    fn delete_additional_income(&mut self, id: HoldingId) -> Result<()>;

    fn insert_termination_event(&mut self, event: TerminationEvent) -> Result<()>;
    fn delete_termination_event(&mut self, id: HoldingId) -> Result<()>;

    fn fixation_record(&self, client_id: ClientId) -> Result<Option<FixationRecord>>;
    fn save_fixation_record(&mut self, record: FixationRecord) -> Result<()>;

    /// Allocate an id for a new row of any kind
    fn next_id(&mut self) -> HoldingId;
}
