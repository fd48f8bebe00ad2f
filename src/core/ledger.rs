use chrono::{DateTime, Utc};

use super::estimator::estimate;
use super::types::{LeadField, LeadRecord, LeadSubmission};
use super::variant::VariantConfig;
use crate::error::LeadError;

/// Append-only list of captured leads for the lifetime of the process.
#[derive(Debug, Default)]
pub struct LeadLedger {
    records: Vec<LeadRecord>,
}

impl LeadLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: LeadRecord) {
        self.records.push(record);
    }

    /// Validates a raw form submission, prices it with the variant's default
    /// savings assumption and appends it. A rejected submission leaves the
    /// ledger untouched.
    pub fn submit(
        &mut self,
        submission: LeadSubmission,
        config: &VariantConfig,
        submitted_at: DateTime<Utc>,
    ) -> Result<&LeadRecord, LeadError> {
        let record = build_record(submission, config, submitted_at)?;
        let index = self.records.len();
        self.append(record);
        Ok(&self.records[index])
    }

    pub fn all(&self) -> &[LeadRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total(&self, field: LeadField) -> f64 {
        self.records
            .iter()
            .map(|record| match field {
                LeadField::MonthlyVolume => record.monthly_volume,
                LeadField::EstimatedSavings => record.estimated_savings,
            })
            .sum()
    }

    /// Drops every record and returns how many were removed.
    pub fn reset(&mut self) -> usize {
        let cleared = self.records.len();
        self.records.clear();
        cleared
    }
}

fn build_record(
    submission: LeadSubmission,
    config: &VariantConfig,
    submitted_at: DateTime<Utc>,
) -> Result<LeadRecord, LeadError> {
    let business_name = required("business name", &submission.business_name)?;
    let owner_name = required("owner name", &submission.owner_name)?;
    let input =
        config.lead_estimate_input(submission.monthly_volume, submission.current_rate_percent)?;
    let estimated_savings = estimate(&input).annual_savings;

    Ok(LeadRecord {
        submitted_at,
        business_name,
        owner_name,
        phone: optional(submission.phone),
        email: optional(submission.email),
        monthly_volume: input.monthly_volume,
        current_rate_percent: input.current_rate_percent,
        estimated_savings,
        statement_attached: submission.statement_attached,
        notes: optional(submission.notes),
    })
}

fn required(field: &'static str, value: &str) -> Result<String, LeadError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LeadError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
