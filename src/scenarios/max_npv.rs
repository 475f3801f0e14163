//! Maximum NPV (balanced): capitalize part of the pension value while
//! keeping the remaining pension at or above the floor

use log::info;

use crate::action::ActionType;
use crate::error::Result;
use crate::services::{TerminationChoice, TerminationPolicy};
use crate::store::HoldingsRepository;

use super::base::{ScenarioBuilder, ScenarioContext, ScenarioId};
use super::capitalize::{capitalize_worst_first, eligible_funds, pension_value, CapitalizationLimits};

/// Exempt portion redeemed, taxable portion annuitized
pub const MAX_NPV_TERMINATION: TerminationPolicy =
    TerminationPolicy::new(TerminationChoice::RedeemWithExemption, TerminationChoice::Annuity);

#[derive(Debug, Clone, Copy, Default)]
pub struct MaxNpvScenario;

impl ScenarioBuilder for MaxNpvScenario {
    fn id(&self) -> ScenarioId {
        ScenarioId::MaxNpv
    }

    fn build_scenario(&self, repo: &mut dyn HoldingsRepository, ctx: &mut ScenarioContext) -> Result<()> {
        ctx.handle_termination(repo, MAX_NPV_TERMINATION)?;
        let conversions = ctx.conversions();
        conversions.convert_education_funds_to_capital(repo, &mut ctx.log)?;
        conversions.convert_all_pension_to_pension(repo, &mut ctx.log)?;

        let funds = eligible_funds(repo, ctx)?;
        let total: f64 = funds.iter().map(|f| f.monthly_pension()).sum();
        let floor = ctx.config.minimum_pension;

        if total <= floor {
            ctx.log.record(
                ActionType::Note,
                format!("total pension {:.2} at or below minimum {:.2}; no capitalization", total, floor),
                "pension funds",
                "pension funds",
                total,
            );
            return Ok(());
        }

        let pension_value = pension_value(&funds)?;
        let target = (ctx.config.npv_capitalization_share * pension_value)
            .min((total - floor) * ctx.config.pension_coefficient);
        info!(
            "client {}: balanced target {:.2} of pension value {:.2}",
            ctx.client_id(),
            target,
            pension_value
        );

        let summary = capitalize_worst_first(
            repo,
            ctx,
            funds,
            CapitalizationLimits { pension: total - floor, capital: Some(target) },
        )?;
        info!(
            "client {}: capitalized {} rows, capital +{:.2}",
            ctx.client_id(),
            summary.rows,
            summary.capital_created
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioConfig;
    use crate::holdings::{ComponentBreakdown, InputMode, PensionFund, Provenance, TaxTreatment};
    use crate::scenarios::ScenarioRequest;
    use crate::testing::{empty_repository, sample_repository};
    use approx::assert_relative_eq;

    fn config() -> ScenarioConfig {
        ScenarioConfig::default().with_minimum_pension(5_500.0)
    }

    #[test]
    fn test_floor_bound_target() {
        let mut repo = empty_repository();
        repo.insert_pension_fund(PensionFund::new(1, 1, "A").with_pension(3_000.0, 150.0)).unwrap();
        repo.insert_pension_fund(PensionFund::new(2, 1, "B").with_pension(4_000.0, 220.0)).unwrap();

        let result = MaxNpvScenario.run(&mut repo, &ScenarioRequest::new(1), &config()).unwrap();

        // min(0.5 * 1_330_000, 1_500 * 200) = 300_000
        assert_relative_eq!(result.total_capital, 300_000.0, epsilon = 0.01);
        let funds = repo.pension_funds(1).unwrap();
        assert_eq!(funds[0].pension_amount, Some(3_000.0));
        assert_relative_eq!(funds[1].monthly_pension(), 4_000.0 - 300_000.0 / 220.0, epsilon = 1e-6);
        assert!(result.total_pension >= 5_500.0);
    }

    #[test]
    fn test_half_value_target() {
        let mut repo = empty_repository();
        repo.insert_pension_fund(PensionFund::new(1, 1, "A").with_pension(10_000.0, 200.0)).unwrap();

        let result = MaxNpvScenario.run(&mut repo, &ScenarioRequest::new(1), &config()).unwrap();

        // min(0.5 * 2_000_000, 4_500 * 200) = 900_000
        assert_relative_eq!(result.total_capital, 900_000.0, epsilon = 0.01);
        assert_relative_eq!(result.total_pension, 5_500.0, epsilon = 0.01);
    }

    #[test]
    fn test_component_restriction_applied_per_row_only() {
        let mut repo = empty_repository();
        repo.insert_pension_fund(
            PensionFund::new(1, 1, "Imported")
                .with_pension(10_000.0, 200.0)
                .with_provenance(Provenance::PortfolioImport {
                    account_number: "P-7".into(),
                    components: Some(ComponentBreakdown {
                        severance_post_settlement: 250_000.0,
                        contributions_post_2000: 750_000.0,
                        ..Default::default()
                    }),
                }),
        )
        .unwrap();

        let result = MaxNpvScenario.run(&mut repo, &ScenarioRequest::new(1), &config()).unwrap();

        // target min(1_000_000, 900_000); the row releases only its 25% eligible share
        assert_relative_eq!(result.total_capital, 500_000.0, epsilon = 0.01);
        assert_relative_eq!(result.total_pension, 7_500.0, epsilon = 0.01);
    }

    #[test]
    fn test_manual_pension_without_factor_kept() {
        let mut repo = empty_repository();
        let mut manual = PensionFund::new(1, 1, "Manual");
        manual.pension_amount = Some(8_000.0);
        manual.input_mode = InputMode::Manual;
        repo.insert_pension_fund(manual).unwrap();

        let result = MaxNpvScenario.run(&mut repo, &ScenarioRequest::new(1), &config()).unwrap();

        assert_eq!(result.total_pension, 8_000.0);
        assert_eq!(result.capital_asset_count, 0);
    }

    #[test]
    fn test_below_floor_keeps_pensions() {
        let mut repo = empty_repository();
        repo.insert_pension_fund(PensionFund::new(1, 1, "Main").with_balance(1_000_000.0, 200.0))
            .unwrap();

        let result = MaxNpvScenario.run(&mut repo, &ScenarioRequest::new(1), &config()).unwrap();

        assert_eq!(result.total_pension, 5_000.0);
        assert_eq!(result.capital_asset_count, 0);
    }

    #[test]
    fn test_termination_split() {
        let mut repo = sample_repository();
        MaxNpvScenario.run(&mut repo, &ScenarioRequest::new(1), &config()).unwrap();

        let redeemed: Vec<_> = repo
            .capital_assets(1)
            .unwrap()
            .into_iter()
            .filter(|a| a.current_value > 0.0)
            .collect();
        assert_eq!(redeemed.len(), 1);
        assert_eq!(redeemed[0].current_value, 50_000.0);
        assert_eq!(redeemed[0].tax_treatment, TaxTreatment::Exempt);

        let severance_pension = repo
            .pension_funds(1)
            .unwrap()
            .into_iter()
            .find(|f| f.name.starts_with("Severance pension"))
            .unwrap();
        assert_eq!(severance_pension.tax_treatment, TaxTreatment::Taxable);
        assert_eq!(severance_pension.pension_amount, Some(400.0));
    }

    #[test]
    fn test_floor_respected_on_sample() {
        let mut repo = sample_repository();
        let result = MaxNpvScenario.run(&mut repo, &ScenarioRequest::new(1), &config()).unwrap();
        // A 3000 + B 4000 + severance 400; capital bounded by 1_900 * 200
        assert_relative_eq!(result.total_pension, 7_400.0 - 380_000.0 / 220.0, epsilon = 0.01);
    }
}
