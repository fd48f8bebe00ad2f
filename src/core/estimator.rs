use super::types::{
    CommissionEstimate, EstimateInput, EstimateResult, InterchangeBreakdown, ResidualInput,
    ResidualMonth, ResidualProjection,
};

const MONTHS_PER_YEAR: f64 = 12.0;

/// Derives current and projected processing fees for one merchant.
///
/// With no network rate the savings fraction applies to the whole fee bill.
/// With a network rate the bill is split into the pass-through network cost
/// and the processor markup above it; only the markup is reduced. A markup
/// that would be negative (quoted rate below the network rate) is floored at
/// zero, so the merchant is shown no savings instead of a loss.
pub fn estimate(input: &EstimateInput) -> EstimateResult {
    let volume = input.monthly_volume;
    let fraction = input.savings_fraction.clamp(0.0, 1.0);
    let current_monthly_fees = volume * (input.current_rate_percent / 100.0);

    let (monthly_savings, breakdown) = match input.network_rate_percent {
        None => (current_monthly_fees * fraction, None),
        Some(network_rate_percent) => {
            let network_cost = volume * (network_rate_percent / 100.0);
            let processor_markup = (current_monthly_fees - network_cost).max(0.0);
            let switch_savings = processor_markup * fraction;
            let breakdown = InterchangeBreakdown {
                network_rate_percent,
                network_cost,
                processor_markup,
                markup_after_switch: processor_markup - switch_savings,
            };
            (switch_savings, Some(breakdown))
        }
    };

    let new_monthly_fees = current_monthly_fees - monthly_savings;
    let savings_percent = if current_monthly_fees > 0.0 {
        monthly_savings / current_monthly_fees * 100.0
    } else {
        0.0
    };
    let new_effective_rate_percent = if volume > 0.0 {
        new_monthly_fees / volume * 100.0
    } else {
        0.0
    };

    EstimateResult {
        current_monthly_fees,
        current_annual_fees: current_monthly_fees * MONTHS_PER_YEAR,
        new_monthly_fees,
        new_annual_fees: new_monthly_fees * MONTHS_PER_YEAR,
        monthly_savings,
        annual_savings: monthly_savings * MONTHS_PER_YEAR,
        savings_percent,
        new_effective_rate_percent,
        breakdown,
    }
}

/// Rep-side view of an estimate: a share of the merchant's annual savings,
/// plus the recurring residual earned on the fees the merchant keeps paying.
pub fn commission_estimate(
    result: &EstimateResult,
    commission_fraction: f64,
) -> CommissionEstimate {
    let annual_commission = result.annual_savings * commission_fraction;
    let monthly_residual = result.new_monthly_fees * commission_fraction;
    CommissionEstimate {
        commission_fraction,
        annual_commission,
        monthly_commission: annual_commission / MONTHS_PER_YEAR,
        monthly_residual,
        annual_residual: monthly_residual * MONTHS_PER_YEAR,
    }
}

/// Residual income in `month` (1-based) when `deals_per_month` merchants are
/// signed every month and none churn.
pub fn month_income(deals_per_month: u32, month: u32, residual_per_merchant: f64) -> f64 {
    active_merchants(deals_per_month, month) as f64 * residual_per_merchant
}

fn active_merchants(deals_per_month: u32, month: u32) -> u64 {
    u64::from(deals_per_month) * u64::from(month)
}

pub fn project_residuals(input: &ResidualInput) -> ResidualProjection {
    let mut months = Vec::with_capacity(input.horizon_months as usize);
    let mut cumulative_income = 0.0;
    for month in 1..=input.horizon_months {
        let monthly_income =
            month_income(input.deals_per_month, month, input.residual_per_merchant);
        cumulative_income += monthly_income;
        months.push(ResidualMonth {
            month,
            active_merchants: active_merchants(input.deals_per_month, month),
            monthly_income,
            cumulative_income,
        });
    }

    ResidualProjection {
        deals_per_month: input.deals_per_month,
        residual_per_merchant: input.residual_per_merchant,
        final_monthly_income: months.last().map_or(0.0, |m| m.monthly_income),
        total_income: cumulative_income,
        months,
    }
}
