//! Retirement scenarios CLI
//!
//! Usage: `retirement_scenarios --client client.json [--funds-csv funds.csv]
//! [--config config.json] [--retirement-age N] [--execute max_npv [--apply-exemption]] [--json]`

use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use retirement_scenarios::holdings::ClientBundle;
use retirement_scenarios::services::CommutationExemptionService;
use retirement_scenarios::{
    HoldingsRepository, InMemoryRepository, Provenance, ScenarioConfig, ScenarioId, ScenarioRequest,
    ScenarioResult, ScenarioRunner,
};

#[derive(Parser, Debug)]
#[command(name = "retirement_scenarios")]
#[command(about = "Compare retirement payout strategies for one client")]
struct Args {
    /// Client bundle JSON: client record, holdings, fixation record, optional portfolio
    #[arg(long)]
    client: PathBuf,

    /// Extra pension funds from a CSV statement export
    #[arg(long)]
    funds_csv: Option<PathBuf>,

    /// Policy values JSON; defaults apply to missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Retirement age; the configured default when omitted
    #[arg(long)]
    retirement_age: Option<u32>,

    /// Apply one strategy permanently (max_pension, max_capital, max_npv)
    #[arg(long)]
    execute: Option<ScenarioId>,

    /// Reassign taxable commutations to the exempt allowance after --execute
    #[arg(long)]
    apply_exemption: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    if args.apply_exemption && args.execute.is_none() {
        bail!("--apply-exemption requires --execute");
    }

    let config = match &args.config {
        Some(path) => ScenarioConfig::from_json_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScenarioConfig::default(),
    };
    let bundle = ClientBundle::from_json_path(&args.client)
        .with_context(|| format!("loading client bundle {}", args.client.display()))?;
    let mut repo = InMemoryRepository::from_bundle(&bundle).context("building holdings store")?;
    if let Some(path) = &args.funds_csv {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let count = repo
            .load_funds_csv(file, bundle.client.id)
            .with_context(|| format!("loading pension funds from {}", path.display()))?;
        info!("loaded {} pension funds from {}", count, path.display());
    }

    let mut request = ScenarioRequest::new(bundle.client.id).with_portfolio(bundle.portfolio.clone());
    if let Some(age) = args.retirement_age {
        request = request.with_retirement_age(age);
    }

    let runner = ScenarioRunner::new(config);

    match args.execute {
        None => {
            let comparison = runner
                .build_all_scenarios(&mut repo, &request)
                .context("building scenarios")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&comparison)?);
            } else {
                println!("Retirement scenarios for {} (#{})", bundle.client.name, bundle.client.id);
                println!("{}", "=".repeat(78));
                print_summary_header();
                for (_, result) in comparison.iter() {
                    print_summary_row(result);
                }
                if let Some(best) = comparison.best_by_npv() {
                    println!("\nHighest NPV: {}", best.display_name);
                }
            }
        }
        Some(id) => {
            let result = runner
                .execute(&mut repo, id, &request)
                .with_context(|| format!("executing {}", id.as_str()))?;
            let exemption = if args.apply_exemption {
                let outcome = CommutationExemptionService::new(bundle.client.id)
                    .apply(&mut repo)
                    .context("applying commutation exemption")?;
                info!(
                    "exempted {} rows, used {:.2}, remaining {:.2}",
                    outcome.exempted.len(),
                    outcome.used,
                    outcome.remaining
                );
                Some(outcome)
            } else {
                None
            };

            if args.json {
                let output = serde_json::json!({
                    "result": result,
                    "exemption": exemption,
                    "pension_funds": repo.pension_funds(bundle.client.id)?,
                    "capital_assets": repo.capital_assets(bundle.client.id)?,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_summary_header();
                print_summary_row(&result);
                print_plan(&result);
                print_holdings(&repo, bundle.client.id)?;
                if let Some(outcome) = exemption {
                    println!(
                        "\nExemption: {} commutations exempted, used {:.2}, remaining {:.2}",
                        outcome.exempted.len(),
                        outcome.used,
                        outcome.remaining
                    );
                }
            }
        }
    }

    Ok(())
}

fn print_summary_header() {
    println!(
        "{:<24} {:>5} {:>14} {:>16} {:>12} {:>18}",
        "Scenario", "Age", "Pension/mo", "Capital", "Other/mo", "NPV"
    );
    println!("{}", "-".repeat(94));
}

fn print_summary_row(result: &ScenarioResult) {
    println!(
        "{:<24} {:>5} {:>14.2} {:>16.2} {:>12.2} {:>18.2}",
        result.display_name,
        result.retirement_age,
        result.total_pension,
        result.total_capital,
        result.total_additional_income,
        result.npv
    );
}

fn print_plan(result: &ScenarioResult) {
    println!("\nExecution plan ({} actions):", result.actions.len());
    for (i, action) in result.actions.iter().enumerate() {
        println!(
            "{:>3}. {:<22} {} -> {} ({:.2}): {}",
            i + 1,
            format!("{:?}", action.action_type),
            action.from,
            action.to,
            action.amount,
            action.detail
        );
    }
}

fn print_holdings(repo: &dyn HoldingsRepository, client_id: u64) -> Result<()> {
    println!("\nPension funds:");
    for fund in repo.pension_funds(client_id)? {
        println!(
            "  {:<40} {:>12.2}/mo  {:?}  {}  {}",
            fund.label(),
            fund.monthly_pension(),
            fund.tax_treatment,
            fund.state.label(),
            origin(fund.provenance.as_ref())
        );
    }
    println!("Capital assets:");
    for asset in repo.capital_assets(client_id)? {
        println!(
            "  {:<40} value {:>12.2}  income {:>12.2}  {:?}  {}",
            asset.label(),
            asset.current_value,
            asset.monthly_income,
            asset.tax_treatment,
            origin(asset.provenance.as_ref())
        );
    }
    Ok(())
}

fn origin(provenance: Option<&Provenance>) -> String {
    match provenance {
        Some(p) => match p.source_id() {
            Some(id) => format!("{} from #{}", p.kind(), id),
            None => p.kind().to_string(),
        },
        None => String::new(),
    }
}
