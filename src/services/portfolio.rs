//! Materialize pension-portfolio statement accounts into pension fund rows
//!
//! Accounts arrive as pre-parsed dictionaries. Product-type strings are
//! classified through [`ProductKind`]; accounts are de-duplicated by account
//! number against both existing rows and the payload itself.

use std::collections::BTreeSet;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::action::{ActionLog, ActionType};
use crate::config::DEFAULT_PENSION_COEFFICIENT;
use crate::error::{EngineError, Result};
use crate::holdings::{
    ClientId, ComponentBreakdown, InputMode, PensionFund, ProductKind, Provenance,
};
use crate::store::HoldingsRepository;

/// One account of a pension-portfolio statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAccount {
    pub account_number: String,
    pub product_type: String,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub balance: Option<f64>,
    #[serde(default)]
    pub components: Option<ComponentBreakdown>,
}

impl PortfolioAccount {
    /// Parse an account dictionary
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|e| EngineError::Portfolio(e.to_string()))
    }

    /// Reported balance, or the component sum when only a breakdown exists
    pub fn effective_balance(&self) -> Result<f64> {
        let balance = match (self.balance, &self.components) {
            (Some(balance), _) => balance,
            (None, Some(components)) => components.total(),
            (None, None) => {
                return Err(EngineError::Portfolio(format!(
                    "account {} has neither balance nor components",
                    self.account_number
                )))
            }
        };
        if balance < 0.0 || !balance.is_finite() {
            return Err(EngineError::InvalidAmount { field: "portfolio balance", value: balance });
        }
        Ok(balance)
    }

    fn display_name(&self) -> String {
        match &self.provider_name {
            Some(provider) => format!("{} - {}", provider, self.product_type),
            None => self.product_type.clone(),
        }
    }
}

/// Counts from one import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct PortfolioImportService {
    client_id: ClientId,
    pension_coefficient: f64,
}

impl PortfolioImportService {
    pub fn new(client_id: ClientId) -> Self {
        Self { client_id, pension_coefficient: DEFAULT_PENSION_COEFFICIENT }
    }

    pub fn with_pension_coefficient(mut self, coefficient: f64) -> Self {
        self.pension_coefficient = coefficient;
        self
    }

    /// Parse and import raw account dictionaries
    pub fn import_values<R: HoldingsRepository + ?Sized>(
        &self,
        repo: &mut R,
        values: &[serde_json::Value],
        log: &mut ActionLog,
    ) -> Result<ImportSummary> {
        let accounts = values
            .iter()
            .map(PortfolioAccount::from_value)
            .collect::<Result<Vec<_>>>()?;
        self.import(repo, &accounts, log)
    }

    /// Create one pension fund per new account number
    pub fn import<R: HoldingsRepository + ?Sized>(
        &self,
        repo: &mut R,
        accounts: &[PortfolioAccount],
        log: &mut ActionLog,
    ) -> Result<ImportSummary> {
        let mut seen: BTreeSet<String> = repo
            .pension_funds(self.client_id)?
            .iter()
            .filter_map(|f| f.provenance.as_ref().and_then(|p| p.account_number()).map(String::from))
            .collect();

        // Validate the whole payload before writing anything
        let mut pending = Vec::new();
        let mut summary = ImportSummary::default();
        for account in accounts {
            if account.account_number.trim().is_empty() {
                return Err(EngineError::Portfolio("account without account number".into()));
            }
            let balance = account.effective_balance()?;
            if !seen.insert(account.account_number.clone()) {
                warn!("account {} already imported, skipped", account.account_number);
                summary.duplicates += 1;
                continue;
            }
            pending.push((account, balance));
        }

        for (account, balance) in pending {
            let kind = ProductKind::classify(&account.product_type);
            let mut fund = PensionFund::new(repo.next_id(), self.client_id, account.display_name())
                .with_category(kind.category())
                .with_tax_treatment(kind.tax_treatment())
                .with_provenance(Provenance::PortfolioImport {
                    account_number: account.account_number.clone(),
                    components: account.components,
                });
            fund.input_mode = InputMode::Calculated;
            fund.balance = Some(balance);
            fund.annuity_factor = Some(kind.annuity_factor(self.pension_coefficient));

            log.record(
                ActionType::ImportPortfolio,
                format!("imported {:?} account, balance {:.2}", kind, balance),
                format!("account {}", account.account_number),
                fund.label(),
                balance,
            );
            repo.insert_pension_fund(fund)?;
            summary.imported += 1;
        }

        info!(
            "client {}: imported {} portfolio accounts ({} duplicates)",
            self.client_id, summary.imported, summary.duplicates
        );
        Ok(summary)
    }
}
