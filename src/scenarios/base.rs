//! Shared scaffolding for every strategy: preconditions, retirement calendar,
//! optional portfolio import, the action log and result aggregation

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionLog};
use crate::calc::{calculate_npv_dcf, retirement_year, round_currency, NpvInputs};
use crate::config::ScenarioConfig;
use crate::convert::convertible_capital;
use crate::error::{EngineError, Result};
use crate::holdings::{Client, ClientId, HoldingState};
use crate::services::{
    ConversionService, PortfolioImportService, TerminationPolicy, TerminationService,
};
use crate::store::HoldingsRepository;

/// Fixed scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    MaxPension,
    MaxCapital,
    MaxNpv,
}

impl ScenarioId {
    pub const ALL: [ScenarioId; 3] = [ScenarioId::MaxPension, ScenarioId::MaxCapital, ScenarioId::MaxNpv];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioId::MaxPension => "max_pension",
            ScenarioId::MaxCapital => "max_capital",
            ScenarioId::MaxNpv => "max_npv",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ScenarioId::MaxPension => "Maximum Pension",
            ScenarioId::MaxCapital => "Maximum Capital",
            ScenarioId::MaxNpv => "Maximum NPV (Balanced)",
        }
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        ScenarioId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| EngineError::Config(format!("unknown scenario '{}'", s)))
    }
}

/// Caller inputs for one scenario build
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub client_id: ClientId,

    /// Requested retirement age; the configured default when absent
    #[serde(default)]
    pub retirement_age: Option<u32>,

    /// Pension-portfolio account dictionaries to import before the strategy
    #[serde(default)]
    pub portfolio: Vec<serde_json::Value>,
}

impl ScenarioRequest {
    pub fn new(client_id: ClientId) -> Self {
        Self { client_id, ..Default::default() }
    }

    pub fn with_retirement_age(mut self, age: u32) -> Self {
        self.retirement_age = Some(age);
        self
    }

    pub fn with_portfolio(mut self, portfolio: Vec<serde_json::Value>) -> Self {
        self.portfolio = portfolio;
        self
    }
}

/// Outcome of one strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_id: ScenarioId,
    pub display_name: String,
    pub retirement_age: u32,
    pub retirement_year: i32,

    /// Monthly pension across all pension rows
    pub total_pension: f64,

    /// Capital across capital rows (commuted values plus literal lump sums)
    pub total_capital: f64,

    /// Frequency-normalized monthly additional income
    pub total_additional_income: f64,

    pub npv: f64,

    /// Active pension rows
    pub pension_fund_count: usize,
    pub capital_asset_count: usize,

    /// Ordered execution plan
    pub actions: Vec<Action>,
}

/// Per-build state shared by a strategy and its services
#[derive(Debug)]
pub struct ScenarioContext {
    pub client: Client,
    pub config: ScenarioConfig,
    pub retirement_age: u32,
    pub retirement_year: i32,
    pub log: ActionLog,
}

impl ScenarioContext {
    /// Check preconditions and import any supplied portfolio
    pub fn prepare(
        repo: &mut dyn HoldingsRepository,
        request: &ScenarioRequest,
        config: &ScenarioConfig,
    ) -> Result<Self> {
        config.validate()?;
        let client = repo.client(request.client_id)?;
        let birth_date = client.birth_date.ok_or(EngineError::MissingBirthDate(client.id))?;
        let retirement_age = request.retirement_age.unwrap_or(config.default_retirement_age);

        let mut ctx = Self {
            retirement_year: retirement_year(birth_date, retirement_age),
            retirement_age,
            config: config.clone(),
            client,
            log: ActionLog::new(),
        };

        if !request.portfolio.is_empty() {
            PortfolioImportService::new(ctx.client.id)
                .with_pension_coefficient(config.pension_coefficient)
                .import_values(repo, &request.portfolio, &mut ctx.log)?;
        }

        let client_id = ctx.client.id;
        if repo.pension_funds(client_id)?.is_empty()
            && repo.capital_assets(client_id)?.is_empty()
            && repo.termination_events(client_id)?.is_empty()
        {
            return Err(EngineError::NoHoldings(client_id));
        }

        Ok(ctx)
    }

    pub fn client_id(&self) -> ClientId {
        self.client.id
    }

    pub fn conversions(&self) -> ConversionService {
        ConversionService::new(self.client.id, self.config.pension_coefficient)
    }

    pub fn handle_termination(
        &mut self,
        repo: &mut dyn HoldingsRepository,
        policy: TerminationPolicy,
    ) -> Result<()> {
        TerminationService::new(self.client.id, self.config.pension_coefficient)
            .handle_all(repo, policy, &mut self.log)
    }

    /// Log missing fixation record or exempt income source; never fails
    pub fn warn_partial_state(&self, repo: &dyn HoldingsRepository) -> Result<()> {
        let client_id = self.client.id;
        if repo.fixation_record(client_id)?.is_none() {
            warn!("client {}: no rights-fixation record", client_id);
        }
        let exempt_pension = repo
            .pension_funds(client_id)?
            .iter()
            .any(|f| f.tax_treatment.is_exempt() && f.monthly_pension() > 0.0);
        let exempt_capital = repo
            .capital_assets(client_id)?
            .iter()
            .any(|a| a.tax_treatment.is_exempt());
        if !exempt_pension && !exempt_capital {
            warn!("client {}: no exempt income source", client_id);
        }
        Ok(())
    }

    /// Aggregate the current holdings into a result bundle
    pub fn finish(self, repo: &dyn HoldingsRepository, scenario_id: ScenarioId) -> Result<ScenarioResult> {
        let client_id = self.client.id;
        let funds = repo.pension_funds(client_id)?;
        let assets = repo.capital_assets(client_id)?;
        let incomes = repo.additional_incomes(client_id)?;

        let total_pension: f64 = funds.iter().map(|f| f.monthly_pension()).sum();
        let total_capital: f64 = assets.iter().map(convertible_capital).sum();
        let total_additional_income: f64 = incomes.iter().map(|i| i.monthly_amount()).sum();

        let years = self.config.horizon_years(self.retirement_age);
        let npv = calculate_npv_dcf(
            &NpvInputs::new(total_pension, total_additional_income, years)
                .with_capital(total_capital)
                .with_discount_rate(self.config.discount_rate),
        );

        let result = ScenarioResult {
            scenario_id,
            display_name: scenario_id.display_name().to_string(),
            retirement_age: self.retirement_age,
            retirement_year: self.retirement_year,
            total_pension: round_currency(total_pension),
            total_capital: round_currency(total_capital),
            total_additional_income: round_currency(total_additional_income),
            npv,
            pension_fund_count: funds.iter().filter(|f| f.state == HoldingState::Active).count(),
            capital_asset_count: assets.len(),
            actions: self.log.into_actions(),
        };
        info!(
            "client {}: {} -> pension {:.2}, capital {:.2}, NPV {:.2}",
            client_id, result.display_name, result.total_pension, result.total_capital, result.npv
        );
        Ok(result)
    }
}

/// A retirement allocation policy
pub trait ScenarioBuilder {
    fn id(&self) -> ScenarioId;

    /// Transform the client's holdings according to this policy
    fn build_scenario(&self, repo: &mut dyn HoldingsRepository, ctx: &mut ScenarioContext) -> Result<()>;

    /// Prepare, build and aggregate in one call
    fn run(
        &self,
        repo: &mut dyn HoldingsRepository,
        request: &ScenarioRequest,
        config: &ScenarioConfig,
    ) -> Result<ScenarioResult> {
        let mut ctx = ScenarioContext::prepare(repo, request, config)?;
        self.build_scenario(repo, &mut ctx)?;
        ctx.finish(repo, self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holdings::Client;
    use crate::store::InMemoryRepository;
    use crate::testing::{empty_repository, sample_repository};

    #[test]
    fn test_missing_birth_date_is_fatal() {
        let mut repo = InMemoryRepository::new();
        repo.add_client(Client { id: 2, name: "No Date".into(), birth_date: None });
        let err = ScenarioContext::prepare(&mut repo, &ScenarioRequest::new(2), &ScenarioConfig::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingBirthDate(2)));
    }

    #[test]
    fn test_no_holdings_is_fatal() {
        let mut repo = empty_repository();
        let err = ScenarioContext::prepare(&mut repo, &ScenarioRequest::new(1), &ScenarioConfig::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::NoHoldings(1)));
    }

    #[test]
    fn test_retirement_year_from_requested_age() {
        let mut repo = sample_repository();
        let request = ScenarioRequest::new(1).with_retirement_age(65);
        let ctx = ScenarioContext::prepare(&mut repo, &request, &ScenarioConfig::default()).unwrap();
        assert_eq!(ctx.retirement_year, 2025);

        let ctx = ScenarioContext::prepare(&mut repo, &ScenarioRequest::new(1), &ScenarioConfig::default())
            .unwrap();
        assert_eq!(ctx.retirement_age, 67);
    }

    #[test]
    fn test_finish_sums_holdings() {
        let mut repo = sample_repository();
        let ctx = ScenarioContext::prepare(&mut repo, &ScenarioRequest::new(1), &ScenarioConfig::default())
            .unwrap();
        let result = ctx.finish(&repo, ScenarioId::MaxPension).unwrap();

        // Fund B has no pension yet; only Fund A pays
        assert_eq!(result.total_pension, 3_000.0);
        assert_eq!(result.total_capital, 300_000.0);
        assert_eq!(result.total_additional_income, 1_000.0);
        assert_eq!(result.capital_asset_count, 2);

        let expected = calculate_npv_dcf(&NpvInputs::new(3_000.0, 1_000.0, 23).with_capital(300_000.0));
        assert_eq!(result.npv, expected);
    }

    #[test]
    fn test_scenario_id_parsing() {
        assert_eq!("max_npv".parse::<ScenarioId>().unwrap(), ScenarioId::MaxNpv);
        assert!("max_fun".parse::<ScenarioId>().is_err());
    }
}
