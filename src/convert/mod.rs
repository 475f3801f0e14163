//! Pure transforms between holding representations, and plain records for
//! snapshotting

pub mod capital;
pub mod pension;
mod records;

pub use capital::{commute_pension, education_to_capital, reverse_commutation, Commutation};
pub use pension::{
    apply_derivation, capital_to_pension, convertible_capital, derive_pension,
    education_to_pension, PensionDerivation,
};
pub use records::{
    AdditionalIncomeRecord, CapitalAssetRecord, PensionFundRecord, TerminationEventRecord,
};
