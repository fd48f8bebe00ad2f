use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Discrete savings assumptions a rep can pick from on the calculator.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SavingsMode {
    Conservative,
    Moderate,
    Aggressive,
}

impl SavingsMode {
    pub const ALL: [SavingsMode; 3] = [
        SavingsMode::Conservative,
        SavingsMode::Moderate,
        SavingsMode::Aggressive,
    ];

    pub fn fraction(self) -> f64 {
        match self {
            SavingsMode::Conservative => 0.30,
            SavingsMode::Moderate => 0.40,
            SavingsMode::Aggressive => 0.50,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SavingsMode::Conservative => "conservative",
            SavingsMode::Moderate => "moderate",
            SavingsMode::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for SavingsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range a numeric widget accepts. Values outside are pulled to the
/// nearest edge rather than rejected.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateInput {
    pub monthly_volume: f64,
    pub current_rate_percent: f64,
    /// Share of the addressable fees removed by switching, in `[0, 1]`.
    pub savings_fraction: f64,
    /// When set, only the markup above this network rate is addressable.
    pub network_rate_percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterchangeBreakdown {
    pub network_rate_percent: f64,
    pub network_cost: f64,
    pub processor_markup: f64,
    pub markup_after_switch: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResult {
    pub current_monthly_fees: f64,
    pub current_annual_fees: f64,
    pub new_monthly_fees: f64,
    pub new_annual_fees: f64,
    pub monthly_savings: f64,
    pub annual_savings: f64,
    pub savings_percent: f64,
    pub new_effective_rate_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<InterchangeBreakdown>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionEstimate {
    pub commission_fraction: f64,
    pub annual_commission: f64,
    pub monthly_commission: f64,
    pub monthly_residual: f64,
    pub annual_residual: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualInput {
    pub deals_per_month: u32,
    pub residual_per_merchant: f64,
    pub horizon_months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidualMonth {
    pub month: u32,
    pub active_merchants: u64,
    pub monthly_income: f64,
    pub cumulative_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidualProjection {
    pub deals_per_month: u32,
    pub residual_per_merchant: f64,
    pub months: Vec<ResidualMonth>,
    pub final_monthly_income: f64,
    pub total_income: f64,
}

/// Raw lead form contents before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadSubmission {
    pub business_name: String,
    pub owner_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub monthly_volume: f64,
    pub current_rate_percent: f64,
    pub notes: Option<String>,
    pub statement_attached: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub submitted_at: DateTime<Utc>,
    pub business_name: String,
    pub owner_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub monthly_volume: f64,
    pub current_rate_percent: f64,
    pub estimated_savings: f64,
    pub statement_attached: bool,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LeadField {
    MonthlyVolume,
    EstimatedSavings,
}
