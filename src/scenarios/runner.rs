//! Runs every strategy against one starting snapshot
//!
//! Holdings are snapshotted once, then restored after each strategy whether it
//! succeeded or not, so `build_all_scenarios` leaves persisted state unchanged.

use std::collections::BTreeMap;

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::error::{EngineError, Result};
use crate::services::StateService;
use crate::store::HoldingsRepository;

use super::base::{ScenarioBuilder, ScenarioId, ScenarioRequest, ScenarioResult};
use super::max_capital::MaxCapitalScenario;
use super::max_npv::MaxNpvScenario;
use super::max_pension::MaxPensionScenario;

/// Result bundles keyed by scenario identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioComparison(BTreeMap<ScenarioId, ScenarioResult>);

impl ScenarioComparison {
    pub fn get(&self, id: ScenarioId) -> Option<&ScenarioResult> {
        self.0.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScenarioId, &ScenarioResult)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Scenario with the highest NPV
    pub fn best_by_npv(&self) -> Option<&ScenarioResult> {
        self.0.values().max_by(|a, b| a.npv.total_cmp(&b.npv))
    }

    pub fn into_inner(self) -> BTreeMap<ScenarioId, ScenarioResult> {
        self.0
    }
}

/// Strategy set plus the policy values they run under
pub struct ScenarioRunner {
    config: ScenarioConfig,
    builders: Vec<Box<dyn ScenarioBuilder>>,
}

impl ScenarioRunner {
    /// Runner with the three standard strategies
    pub fn new(config: ScenarioConfig) -> Self {
        Self::with_builders(
            config,
            vec![
                Box::new(MaxPensionScenario),
                Box::new(MaxCapitalScenario),
                Box::new(MaxNpvScenario),
            ],
        )
    }

    pub fn with_builders(config: ScenarioConfig, builders: Vec<Box<dyn ScenarioBuilder>>) -> Self {
        Self { config, builders }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Build every strategy and restore the starting holdings after each one
    ///
    /// A failing strategy still has its mutations rolled back before the error
    /// is returned.
    pub fn build_all_scenarios(
        &self,
        repo: &mut dyn HoldingsRepository,
        request: &ScenarioRequest,
    ) -> Result<ScenarioComparison> {
        self.config.validate()?;
        let state = StateService::new(request.client_id);
        let snapshot = state.save(&*repo)?;
        info!(
            "client {}: building {} scenarios from {} rows",
            request.client_id,
            self.builders.len(),
            snapshot.row_count()
        );

        let mut results = BTreeMap::new();
        for builder in &self.builders {
            let outcome = builder.run(repo, request, &self.config);
            state.restore(repo, &snapshot)?;
            match outcome {
                Ok(result) => {
                    results.insert(builder.id(), result);
                }
                Err(err) => {
                    error!("client {}: {} failed: {}", request.client_id, builder.id().as_str(), err);
                    return Err(err);
                }
            }
        }
        Ok(ScenarioComparison(results))
    }

    /// Apply one strategy permanently, without restoring
    pub fn execute(
        &self,
        repo: &mut dyn HoldingsRepository,
        id: ScenarioId,
        request: &ScenarioRequest,
    ) -> Result<ScenarioResult> {
        let builder = self
            .builders
            .iter()
            .find(|b| b.id() == id)
            .ok_or_else(|| EngineError::Config(format!("no builder for {}", id.as_str())))?;
        info!("client {}: executing {}", request.client_id, id.display_name());
        builder.run(repo, request, &self.config)
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new(ScenarioConfig::default())
    }
}
