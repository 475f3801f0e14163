//! Lookup tables for product-type and fund-name business rules

use serde::{Deserialize, Serialize};

use super::data::{FundCategory, PensionFund, TaxTreatment};

/// Lower-case name fragments identifying education (study) funds
pub const EDUCATION_NAME_PATTERNS: &[&str] = &["education", "study fund", "hishtalmut"];

/// Portfolio sub-components that may be capitalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapitalizableComponent {
    /// Severance deposited after the rights settlement
    SeverancePostSettlement,
    /// Contributions made before 2000
    ContributionsPre2000,
}

impl CapitalizableComponent {
    pub const ALL: [CapitalizableComponent; 2] = [
        CapitalizableComponent::SeverancePostSettlement,
        CapitalizableComponent::ContributionsPre2000,
    ];
}

/// Product kind inferred from a statement's product-type string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Education,
    Pension,
    Insurance,
    Provident,
    Unknown,
}

/// Substring → kind, checked in order
const PRODUCT_PATTERNS: &[(&str, ProductKind)] = &[
    ("education", ProductKind::Education),
    ("study", ProductKind::Education),
    ("hishtalmut", ProductKind::Education),
    ("provident", ProductKind::Provident),
    ("insurance", ProductKind::Insurance),
    ("pension", ProductKind::Pension),
];

impl ProductKind {
    /// Classify a product-type string by case-insensitive substring match
    pub fn classify(product_type: &str) -> Self {
        let lowered = product_type.to_lowercase();
        PRODUCT_PATTERNS
            .iter()
            .find(|(pattern, _)| lowered.contains(pattern))
            .map(|(_, kind)| *kind)
            .unwrap_or(ProductKind::Unknown)
    }

    /// Annuity factor assumed for balances of this kind
    pub fn annuity_factor(&self, pension_coefficient: f64) -> f64 {
        match self {
            ProductKind::Pension | ProductKind::Insurance => 150.0,
            ProductKind::Provident => 200.0,
            ProductKind::Education | ProductKind::Unknown => pension_coefficient,
        }
    }

    pub fn tax_treatment(&self) -> TaxTreatment {
        match self {
            ProductKind::Education => TaxTreatment::Exempt,
            _ => TaxTreatment::Taxable,
        }
    }

    pub fn category(&self) -> FundCategory {
        match self {
            ProductKind::Education => FundCategory::Education,
            ProductKind::Pension => FundCategory::Pension,
            ProductKind::Insurance => FundCategory::Insurance,
            ProductKind::Provident => FundCategory::Provident,
            ProductKind::Unknown => FundCategory::Other,
        }
    }
}

/// Education funds are always 100% capital and tax-exempt
pub fn is_education_fund(fund: &PensionFund) -> bool {
    if fund.category == FundCategory::Education {
        return true;
    }
    let name = fund.name.to_lowercase();
    EDUCATION_NAME_PATTERNS.iter().any(|pattern| name.contains(pattern))
}
