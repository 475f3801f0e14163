//! Persistence-independent records of holdings
//!
//! Dates are ISO-8601 strings and amounts plain `f64`, so a record set can be
//! written anywhere (JSON, a database blob) and rebuilt into rows exactly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::holdings::{
    AdditionalIncome, CapitalAsset, ClientId, FundCategory, Frequency, HoldingId, HoldingState,
    Indexation, InputMode, PensionFund, Provenance, TaxTreatment, TerminationEvent,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn date_to_string(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn parse_date(text: Option<&str>) -> Result<Option<NaiveDate>> {
    text.map(|t| {
        NaiveDate::parse_from_str(t, DATE_FORMAT).map_err(|_| EngineError::InvalidDate(t.to_string()))
    })
    .transpose()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PensionFundRecord {
    pub id: HoldingId,
    pub client_id: ClientId,
    pub name: String,
    pub category: FundCategory,
    pub input_mode: InputMode,
    pub balance: Option<f64>,
    pub annuity_factor: Option<f64>,
    pub pension_amount: Option<f64>,
    pub pension_start_date: Option<String>,
    pub indexation: Indexation,
    pub indexation_rate: Option<f64>,
    pub tax_treatment: TaxTreatment,
    pub provenance: Option<Provenance>,
    pub state: HoldingState,
}

impl From<&PensionFund> for PensionFundRecord {
    fn from(fund: &PensionFund) -> Self {
        Self {
            id: fund.id,
            client_id: fund.client_id,
            name: fund.name.clone(),
            category: fund.category,
            input_mode: fund.input_mode,
            balance: fund.balance,
            annuity_factor: fund.annuity_factor,
            pension_amount: fund.pension_amount,
            pension_start_date: date_to_string(fund.pension_start_date),
            indexation: fund.indexation,
            indexation_rate: fund.indexation_rate,
            tax_treatment: fund.tax_treatment,
            provenance: fund.provenance.clone(),
            state: fund.state,
        }
    }
}

impl PensionFundRecord {
    pub fn to_fund(&self) -> Result<PensionFund> {
        Ok(PensionFund {
            id: self.id,
            client_id: self.client_id,
            name: self.name.clone(),
            category: self.category,
            input_mode: self.input_mode,
            balance: self.balance,
            annuity_factor: self.annuity_factor,
            pension_amount: self.pension_amount,
            pension_start_date: parse_date(self.pension_start_date.as_deref())?,
            indexation: self.indexation,
            indexation_rate: self.indexation_rate,
            tax_treatment: self.tax_treatment,
            provenance: self.provenance.clone(),
            state: self.state,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalAssetRecord {
    pub id: HoldingId,
    pub client_id: ClientId,
    pub name: String,
    pub current_value: f64,
    pub monthly_income: f64,
    pub start_date: Option<String>,
    pub indexation: Indexation,
    pub indexation_rate: Option<f64>,
    pub tax_treatment: TaxTreatment,
    pub provenance: Option<Provenance>,
}

impl From<&CapitalAsset> for CapitalAssetRecord {
    fn from(asset: &CapitalAsset) -> Self {
        Self {
            id: asset.id,
            client_id: asset.client_id,
            name: asset.name.clone(),
            current_value: asset.current_value,
            monthly_income: asset.monthly_income,
            start_date: date_to_string(asset.start_date),
            indexation: asset.indexation,
            indexation_rate: asset.indexation_rate,
            tax_treatment: asset.tax_treatment,
            provenance: asset.provenance.clone(),
        }
    }
}

impl CapitalAssetRecord {
    pub fn to_asset(&self) -> Result<CapitalAsset> {
        Ok(CapitalAsset {
            id: self.id,
            client_id: self.client_id,
            name: self.name.clone(),
            current_value: self.current_value,
            monthly_income: self.monthly_income,
            start_date: parse_date(self.start_date.as_deref())?,
            indexation: self.indexation,
            indexation_rate: self.indexation_rate,
            tax_treatment: self.tax_treatment,
            provenance: self.provenance.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalIncomeRecord {
    pub id: HoldingId,
    pub client_id: ClientId,
    pub source_name: String,
    pub amount: f64,
    pub frequency: Frequency,
    pub tax_treatment: TaxTreatment,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl From<&AdditionalIncome> for AdditionalIncomeRecord {
    fn from(income: &AdditionalIncome) -> Self {
        Self {
            id: income.id,
            client_id: income.client_id,
            source_name: income.source_name.clone(),
            amount: income.amount,
            frequency: income.frequency,
            tax_treatment: income.tax_treatment,
            start_date: date_to_string(income.start_date),
            end_date: date_to_string(income.end_date),
        }
    }
}

impl AdditionalIncomeRecord {
    pub fn to_income(&self) -> Result<AdditionalIncome> {
        Ok(AdditionalIncome {
            id: self.id,
            client_id: self.client_id,
            source_name: self.source_name.clone(),
            amount: self.amount,
            frequency: self.frequency,
            tax_treatment: self.tax_treatment,
            start_date: parse_date(self.start_date.as_deref())?,
            end_date: parse_date(self.end_date.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationEventRecord {
    pub id: HoldingId,
    pub client_id: ClientId,
    pub employer_name: String,
    pub termination_date: Option<String>,
    pub exempt_amount: f64,
    pub taxable_amount: f64,
}

impl From<&TerminationEvent> for TerminationEventRecord {
    fn from(event: &TerminationEvent) -> Self {
        Self {
            id: event.id,
            client_id: event.client_id,
            employer_name: event.employer_name.clone(),
            termination_date: date_to_string(event.termination_date),
            exempt_amount: event.exempt_amount,
            taxable_amount: event.taxable_amount,
        }
    }
}

impl TerminationEventRecord {
    pub fn to_event(&self) -> Result<TerminationEvent> {
        Ok(TerminationEvent {
            id: self.id,
            client_id: self.client_id,
            employer_name: self.employer_name.clone(),
            termination_date: parse_date(self.termination_date.as_deref())?,
            exempt_amount: self.exempt_amount,
            taxable_amount: self.taxable_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pension_record_round_trip_keeps_dates() {
        let mut fund = PensionFund::new(3, 1, "Central").with_balance(400_000.0, 180.0);
        fund.pension_start_date = NaiveDate::from_ymd_opt(2031, 2, 1);
        fund.indexation = Indexation::Fixed;
        fund.indexation_rate = Some(0.01);

        let record = PensionFundRecord::from(&fund);
        assert_eq!(record.pension_start_date.as_deref(), Some("2031-02-01"));
        assert_eq!(record.to_fund().unwrap(), fund);
    }

    #[test]
    fn test_bad_date_rejected() {
        let mut record = PensionFundRecord::from(&PensionFund::new(1, 1, "F"));
        record.pension_start_date = Some("31/02/2031".into());
        assert!(matches!(record.to_fund(), Err(EngineError::InvalidDate(_))));
    }
}
