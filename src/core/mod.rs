mod estimator;
mod ledger;
mod types;
mod variant;

pub use estimator::{commission_estimate, estimate, month_income, project_residuals};
pub use ledger::LeadLedger;
pub use types::{
    Bounds, CommissionEstimate, EstimateInput, EstimateResult, InterchangeBreakdown, LeadField,
    LeadRecord, LeadSubmission, ResidualInput, ResidualMonth, ResidualProjection, SavingsMode,
};
pub use variant::{ProjectionConfig, Variant, VariantConfig};
