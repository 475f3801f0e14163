//! Holding data structures, provenance tags, lookup tables and loading

mod data;
mod provenance;
pub mod catalog;
pub mod loader;

pub use data::{
    AdditionalIncome, CapitalAsset, Client, ClientId, FixationRecord, Frequency, FundCategory,
    HoldingId, HoldingState, Indexation, InputMode, PensionFund, TaxTreatment, TerminationEvent,
};
pub use provenance::{ComponentBreakdown, ConversionSource, Provenance};
pub use catalog::{is_education_fund, CapitalizableComponent, ProductKind};
pub use loader::{load_pension_funds_from_reader, ClientBundle};
