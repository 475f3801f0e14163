//! Load holdings from CSV statement exports and JSON client bundles

use std::path::Path;

use chrono::NaiveDate;
use csv::Reader;
use serde::{Deserialize, Serialize};

use super::{
    AdditionalIncome, CapitalAsset, Client, ClientId, FixationRecord, FundCategory, HoldingId,
    Indexation, InputMode, PensionFund, TaxTreatment, TerminationEvent,
};
use crate::error::{EngineError, Result};

/// Raw CSV row of a pension-fund statement export
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Balance")]
    balance: Option<f64>,
    #[serde(rename = "AnnuityFactor")]
    annuity_factor: Option<f64>,
    #[serde(rename = "PensionAmount")]
    pension_amount: Option<f64>,
    #[serde(rename = "TaxTreatment")]
    tax_treatment: String,
    #[serde(rename = "Indexation")]
    indexation: String,
    #[serde(rename = "IndexationRate")]
    indexation_rate: Option<f64>,
    #[serde(rename = "PensionStartDate")]
    pension_start_date: Option<String>,
}

impl CsvRow {
    fn to_fund(self, id: HoldingId, client_id: ClientId) -> Result<PensionFund> {
        let category = match self.category.as_str() {
            "Pension" => FundCategory::Pension,
            "Insurance" => FundCategory::Insurance,
            "Provident" => FundCategory::Provident,
            "Education" => FundCategory::Education,
            "Other" => FundCategory::Other,
            other => return Err(EngineError::Portfolio(format!("unknown Category: {}", other))),
        };

        let tax_treatment = match self.tax_treatment.as_str() {
            "Taxable" => TaxTreatment::Taxable,
            "Exempt" => TaxTreatment::Exempt,
            "CapitalGains" => TaxTreatment::CapitalGains,
            other => {
                return Err(EngineError::Portfolio(format!("unknown TaxTreatment: {}", other)))
            }
        };

        let indexation = match self.indexation.as_str() {
            "" | "None" => Indexation::None,
            "Fixed" => Indexation::Fixed,
            "Cpi" | "CPI" => Indexation::Cpi,
            other => return Err(EngineError::Portfolio(format!("unknown Indexation: {}", other))),
        };

        let pension_start_date = match self.pension_start_date.as_deref() {
            None | Some("") => None,
            Some(text) => Some(
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .map_err(|_| EngineError::InvalidDate(text.to_string()))?,
            ),
        };

        // A statement that already reports a pension was entered by hand
        let input_mode = if self.pension_amount.is_some() {
            InputMode::Manual
        } else {
            InputMode::Calculated
        };

        let fund = PensionFund {
            id,
            client_id,
            name: self.name,
            category,
            input_mode,
            balance: self.balance,
            annuity_factor: self.annuity_factor,
            pension_amount: self.pension_amount,
            pension_start_date,
            indexation,
            indexation_rate: self.indexation_rate,
            tax_treatment,
            provenance: None,
            state: Default::default(),
        };
        fund.validate()?;
        Ok(fund)
    }
}

/// Load pension funds from any CSV reader, numbering ids from `first_id`
pub fn load_pension_funds_from_reader<R: std::io::Read>(
    reader: R,
    client_id: ClientId,
    first_id: HoldingId,
) -> Result<Vec<PensionFund>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut funds = Vec::new();

    for (offset, result) in csv_reader.deserialize().enumerate() {
        let row: CsvRow = result?;
        funds.push(row.to_fund(first_id + offset as HoldingId, client_id)?);
    }

    Ok(funds)
}

/// Everything known about one client, as exchanged with the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientBundle {
    pub client: Client,
    #[serde(default)]
    pub pension_funds: Vec<PensionFund>,
    #[serde(default)]
    pub capital_assets: Vec<CapitalAsset>,
    #[serde(default)]
    pub additional_incomes: Vec<AdditionalIncome>,
    #[serde(default)]
    pub termination_events: Vec<TerminationEvent>,
    #[serde(default)]
    pub fixation: Option<FixationRecord>,
    /// Pre-parsed pension-portfolio account dictionaries
    #[serde(default)]
    pub portfolio: Vec<serde_json::Value>,
}

impl ClientBundle {
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
