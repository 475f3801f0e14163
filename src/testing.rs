//! Shared fixtures for unit tests

use chrono::NaiveDate;

use crate::holdings::{
    AdditionalIncome, CapitalAsset, Client, FixationRecord, Frequency, FundCategory, PensionFund,
    TaxTreatment, TerminationEvent,
};
use crate::store::{HoldingsRepository, InMemoryRepository};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn sample_client() -> Client {
    Client {
        id: 1,
        name: "Dana Levi".to_string(),
        birth_date: Some(date(1960, 5, 10)),
    }
}

/// Repository with only the client record
pub fn empty_repository() -> InMemoryRepository {
    let mut repo = InMemoryRepository::new();
    repo.add_client(sample_client());
    repo
}

/// Client 1 with two pension funds, a study fund, two capital assets,
/// quarterly rent, a termination grant and a fixation record
pub fn sample_repository() -> InMemoryRepository {
    let mut repo = empty_repository();

    repo.insert_pension_fund(PensionFund::new(1, 1, "Fund A").with_pension(3_000.0, 150.0))
        .unwrap();
    repo.insert_pension_fund(PensionFund::new(2, 1, "Fund B").with_balance(880_000.0, 220.0))
        .unwrap();
    repo.insert_pension_fund(
        PensionFund::new(3, 1, "Study Fund")
            .with_category(FundCategory::Education)
            .with_balance(100_000.0, 200.0),
    )
    .unwrap();

    repo.insert_capital_asset(CapitalAsset::new(4, 1, "Savings").with_monthly_income(200_000.0))
        .unwrap();
    repo.insert_capital_asset(
        CapitalAsset::new(5, 1, "Exempt deposit")
            .with_monthly_income(100_000.0)
            .with_tax_treatment(TaxTreatment::Exempt),
    )
    .unwrap();

    repo.insert_additional_income(AdditionalIncome {
        id: 6,
        client_id: 1,
        source_name: "Rent".to_string(),
        amount: 3_000.0,
        frequency: Frequency::Quarterly,
        tax_treatment: TaxTreatment::Taxable,
        start_date: Some(date(2020, 1, 1)),
        end_date: None,
    })
    .unwrap();

    repo.insert_termination_event(TerminationEvent {
        id: 7,
        client_id: 1,
        employer_name: "Acme Ltd".to_string(),
        termination_date: Some(date(2027, 5, 31)),
        exempt_amount: 50_000.0,
        taxable_amount: 80_000.0,
    })
    .unwrap();

    repo.save_fixation_record(FixationRecord {
        client_id: 1,
        exempt_capital_remaining: 300_000.0,
        exempt_capital_used: 0.0,
    })
    .unwrap();

    repo
}
