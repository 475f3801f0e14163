//! Error types for the scenario engine
//!
//! Three classes of failure exist:
//! - **Preconditions**: missing client, birth date or holdings (fatal to the call)
//! - **Numeric policy**: values that would require dividing by a non-positive
//!   annuity factor and the like; always rejected before any mutation
//! - **Persistence**: duplicate or missing rows, illegal holding transitions
//!
//! Partial-state warnings (no fixation record, no exempt income source) are not
//! errors; they are logged with `log::warn!` and never surface in results.

use thiserror::Error;

/// Shorthand result type used across the crate
pub type Result<T> = std::result::Result<T, EngineError>;

/// Kind of persisted row, used in error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    PensionFund,
    CapitalAsset,
    AdditionalIncome,
    TerminationEvent,
}

impl std::fmt::Display for RowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RowKind::PensionFund => "pension fund",
            RowKind::CapitalAsset => "capital asset",
            RowKind::AdditionalIncome => "additional income",
            RowKind::TerminationEvent => "termination event",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("client {0} not found")]
    ClientNotFound(u64),

    #[error("client {0} has no birth date; retirement year cannot be derived")]
    MissingBirthDate(u64),

    #[error("client {0} has no holdings to simulate")]
    NoHoldings(u64),

    #[error("no rights-fixation record for client {0}")]
    FixationRecordNotFound(u64),

    #[error("{holding}: annuity factor {factor} must be positive")]
    InvalidAnnuityFactor { holding: String, factor: f64 },

    #[error("{holding}: balance present but no annuity factor to convert it")]
    MissingAnnuityFactor { holding: String },

    #[error("invalid {field}: {value}")]
    InvalidAmount { field: &'static str, value: f64 },

    #[error("{holding}: fixed indexation requires a rate")]
    InvalidIndexation { holding: String },

    #[error("{kind} with id {id} already exists")]
    DuplicateId { kind: RowKind, id: u64 },

    #[error("{kind} with id {id} not found")]
    NotFound { kind: RowKind, id: u64 },

    #[error("{holding}: cannot move from {from} to {to}")]
    InvalidTransition {
        holding: String,
        from: String,
        to: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed portfolio payload: {0}")]
    Portfolio(String),

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_readable() {
        let err = EngineError::InvalidAnnuityFactor {
            holding: "Fund A".into(),
            factor: 0.0,
        };
        assert_eq!(err.to_string(), "Fund A: annuity factor 0 must be positive");

        let err = EngineError::DuplicateId { kind: RowKind::CapitalAsset, id: 7 };
        assert_eq!(err.to_string(), "capital asset with id 7 already exists");
    }
}
