//! Maximum Capital: capitalize every pension above the minimum-pension floor

use log::info;

use crate::action::ActionType;
use crate::error::Result;
use crate::services::{TerminationChoice, TerminationPolicy};
use crate::store::HoldingsRepository;

use super::base::{ScenarioBuilder, ScenarioContext, ScenarioId};
use super::capitalize::{capitalize_worst_first, eligible_funds, CapitalizationLimits};
use super::max_pension::MAX_PENSION_TERMINATION;

/// Both termination portions are redeemed as cash
pub const MAX_CAPITAL_TERMINATION: TerminationPolicy = TerminationPolicy::new(
    TerminationChoice::RedeemWithExemption,
    TerminationChoice::RedeemNoExemption,
);

#[derive(Debug, Clone, Copy, Default)]
pub struct MaxCapitalScenario;

impl ScenarioBuilder for MaxCapitalScenario {
    fn id(&self) -> ScenarioId {
        ScenarioId::MaxCapital
    }

    fn build_scenario(&self, repo: &mut dyn HoldingsRepository, ctx: &mut ScenarioContext) -> Result<()> {
        let conversions = ctx.conversions();
        conversions.convert_all_pension_to_pension(repo, &mut ctx.log)?;

        let funds = eligible_funds(repo, ctx)?;
        let total: f64 = funds.iter().map(|f| f.monthly_pension()).sum();
        let floor = ctx.config.minimum_pension;

        // Below the floor nothing is capitalized: education funds and
        // termination grants go to pension as in Max-Pension
        if total < floor {
            info!(
                "client {}: pension {:.2} below floor {:.2}, converting to pension instead",
                ctx.client_id(),
                total,
                floor
            );
            ctx.log.record(
                ActionType::Note,
                format!("total pension {:.2} below minimum {:.2}; no capitalization", total, floor),
                "pension funds",
                "pension funds",
                total,
            );
            conversions.convert_education_funds_to_pension(repo, &mut ctx.log)?;
            return ctx.handle_termination(repo, MAX_PENSION_TERMINATION);
        }

        conversions.convert_education_funds_to_capital(repo, &mut ctx.log)?;
        ctx.handle_termination(repo, MAX_CAPITAL_TERMINATION)?;

        let summary = capitalize_worst_first(
            repo,
            ctx,
            funds,
            CapitalizationLimits { pension: total - floor, capital: None },
        )?;
        info!(
            "client {}: capitalized {} rows, pension -{:.2}, capital +{:.2}",
            ctx.client_id(),
            summary.rows,
            summary.pension_removed,
            summary.capital_created
        );
        Ok(())
    }
}
