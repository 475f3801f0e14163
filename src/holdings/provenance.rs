//! Provenance tags: which process produced a holding
//!
//! Used for UI explanation and for reversing scenario conversions exactly.

use serde::{Deserialize, Serialize};

use super::catalog::CapitalizableComponent;
use super::data::HoldingId;
use crate::convert::PensionFundRecord;

/// Process that converted one holding into another inside a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSource {
    /// Capital asset turned into a pension
    Capital,
    /// Termination grant routed to annuity or capital
    Termination,
}

/// Balance breakdown reported by a pension-portfolio statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentBreakdown {
    pub severance_post_settlement: f64,
    pub severance_pre_settlement: f64,
    pub contributions_pre_2000: f64,
    pub contributions_post_2000: f64,
}

impl ComponentBreakdown {
    pub fn total(&self) -> f64 {
        self.severance_post_settlement
            + self.severance_pre_settlement
            + self.contributions_pre_2000
            + self.contributions_post_2000
    }

    pub fn amount(&self, component: CapitalizableComponent) -> f64 {
        match component {
            CapitalizableComponent::SeverancePostSettlement => self.severance_post_settlement,
            CapitalizableComponent::ContributionsPre2000 => self.contributions_pre_2000,
        }
    }

    /// Sum of the components eligible for capitalization
    pub fn capitalizable_total(&self) -> f64 {
        CapitalizableComponent::ALL.iter().map(|c| self.amount(*c)).sum()
    }
}

/// Metadata recording how a scenario or import produced a holding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Materialized from an external pension-portfolio statement
    PortfolioImport {
        account_number: String,
        #[serde(default)]
        components: Option<ComponentBreakdown>,
    },
    /// Capital produced by commuting (part of) a pension
    PensionCommutation {
        source_id: HoldingId,
        partial: bool,
        /// Field-by-field copy of the source fund before conversion
        original: Box<PensionFundRecord>,
    },
    /// Education fund converted to pension or capital
    EducationConversion { source_id: HoldingId },
    /// Any other scenario conversion
    ScenarioConversion {
        source: ConversionSource,
        source_id: HoldingId,
    },
}

impl Provenance {
    /// Short tag for display
    pub fn kind(&self) -> &'static str {
        match self {
            Provenance::PortfolioImport { .. } => "portfolio_import",
            Provenance::PensionCommutation { .. } => "pension_commutation",
            Provenance::EducationConversion { .. } => "education_conversion",
            Provenance::ScenarioConversion { .. } => "scenario_conversion",
        }
    }

    /// Id of the holding this one was produced from, if any
    pub fn source_id(&self) -> Option<HoldingId> {
        match self {
            Provenance::PortfolioImport { .. } => None,
            Provenance::PensionCommutation { source_id, .. }
            | Provenance::EducationConversion { source_id }
            | Provenance::ScenarioConversion { source_id, .. } => Some(*source_id),
        }
    }

    /// Account number for imported rows
    pub fn account_number(&self) -> Option<&str> {
        match self {
            Provenance::PortfolioImport { account_number, .. } => Some(account_number),
            _ => None,
        }
    }
}
