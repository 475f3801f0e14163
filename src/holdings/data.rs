//! Holding data structures: pension funds, capital assets, additional income
//! and termination events, plus the client and rights-fixation records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::provenance::Provenance;
use crate::error::{EngineError, Result};

/// Identifier of any persisted holding row
pub type HoldingId = u64;

/// Identifier of a client
pub type ClientId = u64;

/// How a fund's pension amount was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Derived from balance / annuity factor
    Calculated,
    /// Entered directly
    Manual,
}

/// Product category of a pension fund
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundCategory {
    Pension,
    Insurance,
    Provident,
    Education,
    Other,
}

/// Indexation rule for a recurring amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indexation {
    None,
    /// Fixed annual rate; `indexation_rate` must be present
    Fixed,
    /// Linked to the consumer price index
    Cpi,
}

/// Tax treatment carried by a holding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxTreatment {
    Taxable,
    Exempt,
    CapitalGains,
}

impl TaxTreatment {
    pub fn is_exempt(&self) -> bool {
        matches!(self, TaxTreatment::Exempt)
    }
}

/// Lifecycle of a pension fund row inside a scenario
///
/// Converted rows are zeroed rather than deleted so the audit trail survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HoldingState {
    #[default]
    Active,
    /// Amounts moved into another holding
    Converted { target_id: HoldingId },
    /// Amounts reduced to nothing without a single target
    Zeroed,
}

impl HoldingState {
    pub fn label(&self) -> String {
        match self {
            HoldingState::Active => "active".to_string(),
            HoldingState::Converted { target_id } => format!("converted({})", target_id),
            HoldingState::Zeroed => "zeroed".to_string(),
        }
    }
}

/// An annuitized pension product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PensionFund {
    pub id: HoldingId,
    pub client_id: ClientId,

    /// Fund or provider name
    pub name: String,

    pub category: FundCategory,

    pub input_mode: InputMode,

    /// Accumulated capital before conversion to pension
    pub balance: Option<f64>,

    /// Divisor converting balance into monthly pension
    pub annuity_factor: Option<f64>,

    /// Monthly pension amount
    pub pension_amount: Option<f64>,

    pub pension_start_date: Option<NaiveDate>,

    pub indexation: Indexation,

    /// Annual rate for fixed indexation
    pub indexation_rate: Option<f64>,

    pub tax_treatment: TaxTreatment,

    /// How a scenario produced this row, if it did
    #[serde(default)]
    pub provenance: Option<Provenance>,

    #[serde(default)]
    pub state: HoldingState,
}

impl PensionFund {
    /// Create an active, calculated-mode fund with no indexation
    pub fn new(id: HoldingId, client_id: ClientId, name: impl Into<String>) -> Self {
        Self {
            id,
            client_id,
            name: name.into(),
            category: FundCategory::Pension,
            input_mode: InputMode::Calculated,
            balance: None,
            annuity_factor: None,
            pension_amount: None,
            pension_start_date: None,
            indexation: Indexation::None,
            indexation_rate: None,
            tax_treatment: TaxTreatment::Taxable,
            provenance: None,
            state: HoldingState::Active,
        }
    }

    pub fn with_balance(mut self, balance: f64, annuity_factor: f64) -> Self {
        self.balance = Some(balance);
        self.annuity_factor = Some(annuity_factor);
        self
    }

    pub fn with_pension(mut self, pension_amount: f64, annuity_factor: f64) -> Self {
        self.pension_amount = Some(pension_amount);
        self.annuity_factor = Some(annuity_factor);
        self
    }

    pub fn with_category(mut self, category: FundCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_tax_treatment(mut self, tax_treatment: TaxTreatment) -> Self {
        self.tax_treatment = tax_treatment;
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Human-readable label used in actions and error messages
    pub fn label(&self) -> String {
        format!("{} (#{})", self.name, self.id)
    }

    /// Current monthly pension, zero when not yet derived
    pub fn monthly_pension(&self) -> f64 {
        self.pension_amount.unwrap_or(0.0)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        if self.indexation == Indexation::Fixed && self.indexation_rate.is_none() {
            return Err(EngineError::InvalidIndexation { holding: self.label() });
        }
        if let Some(balance) = self.balance {
            if balance < 0.0 || !balance.is_finite() {
                return Err(EngineError::InvalidAmount { field: "balance", value: balance });
            }
        }
        if let Some(factor) = self.annuity_factor {
            if !(factor > 0.0) {
                return Err(EngineError::InvalidAnnuityFactor {
                    holding: self.label(),
                    factor,
                });
            }
        }
        Ok(())
    }

    /// Annuity factor, rejecting absent or non-positive values
    pub fn required_annuity_factor(&self) -> Result<f64> {
        match self.annuity_factor {
            Some(factor) if factor > 0.0 => Ok(factor),
            Some(factor) => Err(EngineError::InvalidAnnuityFactor {
                holding: self.label(),
                factor,
            }),
            None => Err(EngineError::MissingAnnuityFactor { holding: self.label() }),
        }
    }

    /// Record that this row's amounts moved into `target_id`
    pub fn mark_converted(&mut self, target_id: HoldingId) -> Result<()> {
        self.transition(HoldingState::Converted { target_id })
    }

    /// Record that this row's amounts were reduced to nothing
    pub fn mark_zeroed(&mut self) -> Result<()> {
        self.transition(HoldingState::Zeroed)
    }

    fn transition(&mut self, next: HoldingState) -> Result<()> {
        if self.state != HoldingState::Active {
            return Err(EngineError::InvalidTransition {
                holding: self.label(),
                from: self.state.label(),
                to: next.label(),
            });
        }
        self.state = next;
        Ok(())
    }
}

/// A capital holding
///
/// Scenario-generated capital carries a zero `current_value` and the commuted
/// amount in `monthly_income`; literal cash carries `current_value` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalAsset {
    pub id: HoldingId,
    pub client_id: ClientId,
    pub name: String,

    /// One-time lump-sum value
    pub current_value: f64,

    /// Recurring amount; holds the commuted value for generated rows
    pub monthly_income: f64,

    pub start_date: Option<NaiveDate>,

    pub indexation: Indexation,
    pub indexation_rate: Option<f64>,

    pub tax_treatment: TaxTreatment,

    #[serde(default)]
    pub provenance: Option<Provenance>,
}

impl CapitalAsset {
    pub fn new(id: HoldingId, client_id: ClientId, name: impl Into<String>) -> Self {
        Self {
            id,
            client_id,
            name: name.into(),
            current_value: 0.0,
            monthly_income: 0.0,
            start_date: None,
            indexation: Indexation::None,
            indexation_rate: None,
            tax_treatment: TaxTreatment::Taxable,
            provenance: None,
        }
    }

    pub fn with_monthly_income(mut self, amount: f64) -> Self {
        self.monthly_income = amount;
        self
    }

    pub fn with_current_value(mut self, amount: f64) -> Self {
        self.current_value = amount;
        self
    }

    pub fn with_tax_treatment(mut self, tax_treatment: TaxTreatment) -> Self {
        self.tax_treatment = tax_treatment;
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    pub fn label(&self) -> String {
        format!("{} (#{})", self.name, self.id)
    }

    /// True for capital produced by commuting a pension inside a scenario
    pub fn is_scenario_commutation(&self) -> bool {
        matches!(self.provenance, Some(Provenance::PensionCommutation { .. }))
    }
}

/// Payment frequency of additional income
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Annually,
}

impl Frequency {
    /// Convert a per-period amount into a monthly amount
    pub fn to_monthly(&self, amount: f64) -> f64 {
        match self {
            Frequency::Monthly => amount,
            Frequency::Quarterly => amount / 3.0,
            Frequency::Annually => amount / 12.0,
        }
    }
}

/// Recurring non-pension income, read-only to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalIncome {
    pub id: HoldingId,
    pub client_id: ClientId,
    pub source_name: String,
    pub amount: f64,
    pub frequency: Frequency,
    pub tax_treatment: TaxTreatment,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl AdditionalIncome {
    pub fn monthly_amount(&self) -> f64 {
        self.frequency.to_monthly(self.amount)
    }
}

/// A one-time employment-ending event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationEvent {
    pub id: HoldingId,
    pub client_id: ClientId,
    pub employer_name: String,
    pub termination_date: Option<NaiveDate>,

    /// Severance portion eligible for tax exemption
    pub exempt_amount: f64,

    /// Severance portion taxed as income
    pub taxable_amount: f64,
}

impl TerminationEvent {
    pub fn total_amount(&self) -> f64 {
        self.exempt_amount + self.taxable_amount
    }
}

/// Client record consumed by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
}

/// Rights-fixation record holding the remaining tax-exempt capital allowance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationRecord {
    pub client_id: ClientId,

    /// Exempt capital still available
    pub exempt_capital_remaining: f64,

    /// Exempt capital consumed by scenario commutations
    #[serde(default)]
    pub exempt_capital_used: f64,
}
