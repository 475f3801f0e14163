//! Worst-annuity-first capitalization shared by the capital-leaning strategies
//!
//! Rows are ordered by annuity factor descending (a higher factor buys less
//! pension per unit of capital), then commuted whole or partially until either
//! the pension budget or the capital budget runs out.

use std::cmp::Ordering;

use log::{debug, warn};

use crate::action::ActionType;
use crate::convert::commute_pension;
use crate::error::Result;
use crate::holdings::{is_education_fund, HoldingState, PensionFund, Provenance};
use crate::store::HoldingsRepository;

use super::base::ScenarioContext;

/// Amounts below this are treated as exhausted
const BUDGET_EPSILON: f64 = 0.005;

/// Monthly pension of a fund that may be capitalized
///
/// Imported funds with a component breakdown only release the share held in
/// eligible components. Funds without a tag are treated as fully capitalizable.
pub fn capitalizable_pension(fund: &PensionFund) -> f64 {
    let pension = fund.monthly_pension();
    match &fund.provenance {
        Some(Provenance::PortfolioImport { components: Some(components), .. }) => {
            let total = components.total();
            if total > 0.0 {
                pension * (components.capitalizable_total() / total).min(1.0)
            } else {
                0.0
            }
        }
        _ => pension,
    }
}

/// Active, non-education funds currently paying a pension
pub fn eligible_funds(repo: &dyn HoldingsRepository, ctx: &ScenarioContext) -> Result<Vec<PensionFund>> {
    Ok(repo
        .pension_funds(ctx.client_id())?
        .into_iter()
        .filter(|f| f.state == HoldingState::Active && !is_education_fund(f) && f.monthly_pension() > 0.0)
        .collect())
}

/// Budgets bounding one capitalization pass
#[derive(Debug, Clone, Copy)]
pub struct CapitalizationLimits {
    /// Maximum monthly pension that may be removed
    pub pension: f64,
    /// Maximum capital value that may be created
    pub capital: Option<f64>,
}

/// Totals of one capitalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CapitalizationSummary {
    pub pension_removed: f64,
    pub capital_created: f64,
    pub rows: usize,
}

/// Factor a fund would be commuted at
///
/// A fund without a factor (a manually entered pension) cannot be commuted and
/// yields `None`; a factor that is present but not positive is an error.
fn commutation_factor(fund: &PensionFund) -> Result<Option<f64>> {
    match fund.annuity_factor {
        None => Ok(None),
        Some(_) => fund.required_annuity_factor().map(Some),
    }
}

/// Pension-derived value, monthly pension × annuity factor, summed over the
/// funds that can be commuted
pub fn pension_value(funds: &[PensionFund]) -> Result<f64> {
    let mut value = 0.0;
    for fund in funds {
        if let Some(factor) = commutation_factor(fund)? {
            value += fund.monthly_pension() * factor;
        }
    }
    Ok(value)
}

/// Sort by annuity factor descending, ties by id
fn worst_annuity_first(a: &PensionFund, b: &PensionFund) -> Ordering {
    let fa = a.annuity_factor.unwrap_or(0.0);
    let fb = b.annuity_factor.unwrap_or(0.0);
    fb.total_cmp(&fa).then(a.id.cmp(&b.id))
}

/// Commute `funds` worst-annuity-first within `limits`
///
/// Every fund's annuity factor is checked before the first commutation.
/// Funds without a factor stay as pensions.
pub fn capitalize_worst_first(
    repo: &mut dyn HoldingsRepository,
    ctx: &mut ScenarioContext,
    funds: Vec<PensionFund>,
    limits: CapitalizationLimits,
) -> Result<CapitalizationSummary> {
    let mut candidates = Vec::with_capacity(funds.len());
    for fund in funds {
        match commutation_factor(&fund)? {
            Some(factor) => candidates.push((fund, factor)),
            None => warn!("{}: no annuity factor, kept as pension", fund.label()),
        }
    }
    candidates.sort_by(|(a, _), (b, _)| worst_annuity_first(a, b));

    let mut pension_room = limits.pension;
    let mut capital_room = limits.capital.unwrap_or(f64::INFINITY);
    let mut summary = CapitalizationSummary::default();

    for (mut fund, factor) in candidates {
        if pension_room <= BUDGET_EPSILON || capital_room <= BUDGET_EPSILON {
            break;
        }
        let available = capitalizable_pension(&fund);
        let portion = available.min(pension_room).min(capital_room / factor);
        if portion <= BUDGET_EPSILON {
            debug!("{}: nothing capitalizable", fund.label());
            continue;
        }

        let before = fund.monthly_pension();
        let commutation = commute_pension(&mut fund, portion, repo.next_id())?;
        let kind = if commutation.partial { "partial" } else { "full" };
        ctx.log.record(
            ActionType::Capitalize,
            format!(
                "{} capitalization: pension {:.2} -> {:.2}, capital {:.2} at factor {}",
                kind,
                before,
                fund.monthly_pension(),
                commutation.capital_amount,
                factor
            ),
            fund.label(),
            commutation.capital.label(),
            commutation.capital_amount,
        );

        pension_room -= commutation.pension_commuted;
        capital_room -= commutation.capital_amount;
        summary.pension_removed += commutation.pension_commuted;
        summary.capital_created += commutation.capital_amount;
        summary.rows += 1;

        repo.update_pension_fund(&fund)?;
        repo.insert_capital_asset(commutation.capital)?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioConfig;
    use crate::error::EngineError;
    use crate::holdings::{ComponentBreakdown, InputMode};
    use crate::scenarios::ScenarioRequest;
    use crate::testing::empty_repository;

    #[test]
    fn test_untagged_fund_fully_capitalizable() {
        let fund = PensionFund::new(1, 1, "A").with_pension(3_000.0, 150.0);
        assert_eq!(capitalizable_pension(&fund), 3_000.0);
    }

    #[test]
    fn test_component_restriction() {
        let fund = PensionFund::new(1, 1, "Imported")
            .with_pension(4_000.0, 200.0)
            .with_provenance(Provenance::PortfolioImport {
                account_number: "X-1".into(),
                components: Some(ComponentBreakdown {
                    severance_post_settlement: 100_000.0,
                    contributions_pre_2000: 100_000.0,
                    contributions_post_2000: 600_000.0,
                    ..Default::default()
                }),
            });
        assert_eq!(capitalizable_pension(&fund), 1_000.0);
    }

    #[test]
    fn test_import_without_breakdown_fully_capitalizable() {
        let fund = PensionFund::new(1, 1, "Imported")
            .with_pension(2_000.0, 200.0)
            .with_provenance(Provenance::PortfolioImport {
                account_number: "X-2".into(),
                components: None,
            });
        assert_eq!(capitalizable_pension(&fund), 2_000.0);
    }

    #[test]
    fn test_pension_value_skips_funds_without_factor() {
        let mut manual = PensionFund::new(3, 1, "Manual");
        manual.pension_amount = Some(8_000.0);
        let funds = vec![
            PensionFund::new(1, 1, "A").with_pension(3_000.0, 150.0),
            PensionFund::new(2, 1, "B").with_pension(4_000.0, 220.0),
            manual,
        ];
        assert_eq!(pension_value(&funds).unwrap(), 450_000.0 + 880_000.0);

        let broken = vec![PensionFund::new(4, 1, "Broken").with_pension(1_000.0, 0.0)];
        assert!(matches!(pension_value(&broken), Err(EngineError::InvalidAnnuityFactor { .. })));
    }

    #[test]
    fn test_funds_without_factor_are_not_commuted() {
        let mut repo = empty_repository();
        let mut manual = PensionFund::new(1, 1, "Manual");
        manual.pension_amount = Some(8_000.0);
        manual.input_mode = InputMode::Manual;
        repo.insert_pension_fund(manual).unwrap();
        repo.insert_pension_fund(PensionFund::new(2, 1, "B").with_pension(4_000.0, 220.0)).unwrap();

        let mut ctx =
            ScenarioContext::prepare(&mut repo, &ScenarioRequest::new(1), &ScenarioConfig::default())
                .unwrap();
        let funds = eligible_funds(&repo, &ctx).unwrap();
        let summary = capitalize_worst_first(
            &mut repo,
            &mut ctx,
            funds,
            CapitalizationLimits { pension: 6_500.0, capital: None },
        )
        .unwrap();

        assert_eq!(summary.rows, 1);
        assert_eq!(summary.pension_removed, 4_000.0);
        let funds = repo.pension_funds(1).unwrap();
        assert_eq!(funds[0].pension_amount, Some(8_000.0));
        assert_eq!(funds[0].state, HoldingState::Active);
    }

    #[test]
    fn test_non_positive_factor_still_rejected() {
        let mut repo = empty_repository();
        repo.insert_pension_fund(PensionFund::new(1, 1, "Broken").with_pension(4_000.0, -5.0))
            .unwrap();
        let mut ctx =
            ScenarioContext::prepare(&mut repo, &ScenarioRequest::new(1), &ScenarioConfig::default())
                .unwrap();
        let funds = eligible_funds(&repo, &ctx).unwrap();
        let err = capitalize_worst_first(
            &mut repo,
            &mut ctx,
            funds,
            CapitalizationLimits { pension: 1_000.0, capital: None },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAnnuityFactor { .. }));
        assert!(repo.capital_assets(1).unwrap().is_empty());
    }

    #[test]
    fn test_ordering_worst_first() {
        let mut funds = vec![
            PensionFund::new(1, 1, "A").with_pension(3_000.0, 150.0),
            PensionFund::new(2, 1, "B").with_pension(4_000.0, 220.0),
            PensionFund::new(3, 1, "C").with_pension(1_000.0, 180.0),
        ];
        funds.sort_by(worst_annuity_first);
        let ids: Vec<_> = funds.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
