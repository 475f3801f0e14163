//! Maximum Pension: annuitize everything, capitalize nothing

use crate::error::Result;
use crate::services::{TerminationChoice, TerminationPolicy};
use crate::store::HoldingsRepository;

use super::base::{ScenarioBuilder, ScenarioContext, ScenarioId};

/// Both termination portions go to annuity
pub const MAX_PENSION_TERMINATION: TerminationPolicy =
    TerminationPolicy::new(TerminationChoice::Annuity, TerminationChoice::Annuity);

#[derive(Debug, Clone, Copy, Default)]
pub struct MaxPensionScenario;

impl ScenarioBuilder for MaxPensionScenario {
    fn id(&self) -> ScenarioId {
        ScenarioId::MaxPension
    }

    fn build_scenario(&self, repo: &mut dyn HoldingsRepository, ctx: &mut ScenarioContext) -> Result<()> {
        let conversions = ctx.conversions();
        conversions.convert_all_pension_to_pension(repo, &mut ctx.log)?;
        conversions.convert_education_funds_to_pension(repo, &mut ctx.log)?;
        conversions.convert_taxable_capital_to_pension(repo, &mut ctx.log)?;
        conversions.convert_exempt_capital_to_pension(repo, &mut ctx.log)?;
        ctx.handle_termination(repo, MAX_PENSION_TERMINATION)?;
        ctx.warn_partial_state(repo)
    }
}
