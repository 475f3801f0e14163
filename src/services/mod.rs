//! Services operating on a client's persisted holdings

pub mod conversion;
pub mod exemption;
pub mod portfolio;
pub mod state;
pub mod termination;

pub use conversion::{CapitalSelection, ConversionService};
pub use exemption::{CommutationExemptionService, ExemptionOutcome, ExemptionPlan};
pub use portfolio::{ImportSummary, PortfolioAccount, PortfolioImportService};
pub use state::{HoldingsSnapshot, StateService};
pub use termination::{TerminationChoice, TerminationPolicy, TerminationService};
