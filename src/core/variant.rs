use std::{fmt, str::FromStr};

use serde::Serialize;

use super::types::{Bounds, EstimateInput, ResidualInput, SavingsMode};
use crate::error::InputError;

/// The four calculator flavours. They share every formula and differ only in
/// the constants returned by [`Variant::config`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    Pocket,
    Tiered,
    Interchange,
    Residual,
}

const CONSERVATIVE_ONLY: &[SavingsMode] = &[SavingsMode::Conservative];
const ALL_MODES: &[SavingsMode] = &SavingsMode::ALL;

const COMMISSION_FRACTION: f64 = 0.25;
const NETWORK_RATE_PERCENT: f64 = 1.8;
const CALCULATOR_VOLUME: Bounds = Bounds::new(1_000.0, 10_000_000.0);
const CALCULATOR_RATE: Bounds = Bounds::new(1.5, 5.0);
const LEAD_VOLUME: Bounds = Bounds::new(0.0, 10_000_000.0);
const LEAD_RATE: Bounds = Bounds::new(0.0, 10.0);

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Pocket,
        Variant::Tiered,
        Variant::Interchange,
        Variant::Residual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Pocket => "pocket",
            Variant::Tiered => "tiered",
            Variant::Interchange => "interchange",
            Variant::Residual => "residual",
        }
    }

    pub fn config(self) -> VariantConfig {
        let base = VariantConfig {
            variant: self,
            title: "Pocket Analyst",
            savings_modes: ALL_MODES,
            default_savings_mode: SavingsMode::Conservative,
            network_rate_percent: None,
            commission_fraction: COMMISSION_FRACTION,
            volume_bounds: CALCULATOR_VOLUME,
            rate_bounds: CALCULATOR_RATE,
            lead_volume_bounds: LEAD_VOLUME,
            lead_rate_bounds: LEAD_RATE,
            projection: None,
        };

        match self {
            Variant::Pocket => VariantConfig {
                savings_modes: CONSERVATIVE_ONLY,
                ..base
            },
            Variant::Tiered => VariantConfig {
                title: "Pocket Analyst: Savings Tiers",
                ..base
            },
            Variant::Interchange => VariantConfig {
                title: "Pocket Analyst: Interchange Breakdown",
                default_savings_mode: SavingsMode::Aggressive,
                network_rate_percent: Some(NETWORK_RATE_PERCENT),
                ..base
            },
            Variant::Residual => VariantConfig {
                title: "Pocket Analyst: Residual Builder",
                projection: Some(ProjectionConfig {
                    horizon_months: 36,
                    deals_per_month_min: 1,
                    deals_per_month_max: 20,
                    default_deals_per_month: 4,
                }),
                ..base
            },
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Variant::ALL
            .into_iter()
            .find(|variant| variant.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| InputError::UnknownVariant(needle.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionConfig {
    pub horizon_months: u32,
    pub deals_per_month_min: u32,
    pub deals_per_month_max: u32,
    pub default_deals_per_month: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantConfig {
    pub variant: Variant,
    pub title: &'static str,
    pub savings_modes: &'static [SavingsMode],
    pub default_savings_mode: SavingsMode,
    pub network_rate_percent: Option<f64>,
    pub commission_fraction: f64,
    pub volume_bounds: Bounds,
    pub rate_bounds: Bounds,
    pub lead_volume_bounds: Bounds,
    pub lead_rate_bounds: Bounds,
    pub projection: Option<ProjectionConfig>,
}

impl VariantConfig {
    pub fn offers(&self, mode: SavingsMode) -> bool {
        self.savings_modes.contains(&mode)
    }

    /// Builds a calculator input, clamping volume and rate into the
    /// calculator bounds. Non-finite numbers and savings modes the variant
    /// does not offer are rejected.
    pub fn estimate_input(
        &self,
        monthly_volume: f64,
        current_rate_percent: f64,
        mode: Option<SavingsMode>,
    ) -> Result<EstimateInput, InputError> {
        let mode = mode.unwrap_or(self.default_savings_mode);
        if !self.offers(mode) {
            return Err(InputError::SavingsModeNotOffered {
                mode,
                variant: self.variant,
            });
        }
        self.clamped_input(
            monthly_volume,
            current_rate_percent,
            mode,
            self.volume_bounds,
            self.rate_bounds,
        )
    }

    /// Same as [`estimate_input`](Self::estimate_input) but with the wider lead
    /// form bounds and the variant's default savings assumption.
    pub fn lead_estimate_input(
        &self,
        monthly_volume: f64,
        current_rate_percent: f64,
    ) -> Result<EstimateInput, InputError> {
        self.clamped_input(
            monthly_volume,
            current_rate_percent,
            self.default_savings_mode,
            self.lead_volume_bounds,
            self.lead_rate_bounds,
        )
    }

    pub fn residual_input(
        &self,
        deals_per_month: Option<i64>,
        residual_per_merchant: f64,
    ) -> Result<ResidualInput, InputError> {
        let projection = self
            .projection
            .ok_or(InputError::ProjectionUnavailable(self.variant))?;
        let residual_per_merchant = finite("residualPerMerchant", residual_per_merchant)?;
        let deals_per_month = match deals_per_month {
            Some(requested) => requested.clamp(
                i64::from(projection.deals_per_month_min),
                i64::from(projection.deals_per_month_max),
            ) as u32,
            None => projection.default_deals_per_month,
        };

        Ok(ResidualInput {
            deals_per_month,
            residual_per_merchant: residual_per_merchant.max(0.0),
            horizon_months: projection.horizon_months,
        })
    }

    fn clamped_input(
        &self,
        monthly_volume: f64,
        current_rate_percent: f64,
        mode: SavingsMode,
        volume_bounds: Bounds,
        rate_bounds: Bounds,
    ) -> Result<EstimateInput, InputError> {
        let monthly_volume = finite("monthlyVolume", monthly_volume)?;
        let current_rate_percent = finite("currentRate", current_rate_percent)?;
        Ok(EstimateInput {
            monthly_volume: volume_bounds.clamp(monthly_volume),
            current_rate_percent: rate_bounds.clamp(current_rate_percent),
            savings_fraction: mode.fraction(),
            network_rate_percent: self.network_rate_percent,
        })
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, InputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputError::NotFinite { field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_names_round_trip_through_from_str() {
        for variant in Variant::ALL {
            assert_eq!(variant.as_str().parse::<Variant>(), Ok(variant));
        }
        assert_eq!(" Interchange ".parse::<Variant>(), Ok(Variant::Interchange));
    }

    #[test]
    fn unknown_variant_is_rejected() {
        let err = "deluxe".parse::<Variant>().expect_err("must reject");
        assert_eq!(err, InputError::UnknownVariant("deluxe".to_string()));
    }

    #[test]
    fn variants_differ_only_in_their_constants() {
        let pocket = Variant::Pocket.config();
        assert_eq!(pocket.savings_modes, &[SavingsMode::Conservative]);
        assert!(pocket.network_rate_percent.is_none());
        assert!(pocket.projection.is_none());

        let tiered = Variant::Tiered.config();
        assert_eq!(tiered.savings_modes.len(), 3);
        assert_eq!(tiered.default_savings_mode, SavingsMode::Conservative);

        let interchange = Variant::Interchange.config();
        assert_eq!(interchange.network_rate_percent, Some(1.8));
        assert_eq!(interchange.default_savings_mode, SavingsMode::Aggressive);

        let residual = Variant::Residual.config();
        let projection = residual.projection.expect("residual variant projects");
        assert_eq!(projection.horizon_months, 36);

        for variant in Variant::ALL {
            let config = variant.config();
            assert_eq!(config.commission_fraction, 0.25);
            assert!(config.offers(config.default_savings_mode));
        }
    }

    #[test]
    fn estimate_input_clamps_to_calculator_bounds() {
        let config = Variant::Tiered.config();

        let low = config
            .estimate_input(10.0, 0.2, Some(SavingsMode::Moderate))
            .expect("valid input");
        assert_eq!(low.monthly_volume, 1_000.0);
        assert_eq!(low.current_rate_percent, 1.5);
        assert_eq!(low.savings_fraction, 0.40);

        let high = config
            .estimate_input(50_000_000.0, 9.0, None)
            .expect("valid input");
        assert_eq!(high.monthly_volume, 10_000_000.0);
        assert_eq!(high.current_rate_percent, 5.0);
        assert_eq!(high.savings_fraction, 0.30);
    }

    #[test]
    fn estimate_input_rejects_non_finite_numbers() {
        let config = Variant::Pocket.config();
        let err = config
            .estimate_input(f64::NAN, 3.0, None)
            .expect_err("must reject NaN volume");
        assert_eq!(err, InputError::NotFinite { field: "monthlyVolume" });

        let err = config
            .estimate_input(50_000.0, f64::INFINITY, None)
            .expect_err("must reject infinite rate");
        assert_eq!(err, InputError::NotFinite { field: "currentRate" });
    }

    #[test]
    fn estimate_input_rejects_modes_the_variant_does_not_offer() {
        let err = Variant::Pocket
            .config()
            .estimate_input(50_000.0, 3.0, Some(SavingsMode::Aggressive))
            .expect_err("pocket only offers conservative");
        assert_eq!(
            err,
            InputError::SavingsModeNotOffered {
                mode: SavingsMode::Aggressive,
                variant: Variant::Pocket,
            }
        );
    }

    #[test]
    fn interchange_input_carries_network_rate() {
        let input = Variant::Interchange
            .config()
            .estimate_input(50_000.0, 3.5, None)
            .expect("valid input");
        assert_eq!(input.network_rate_percent, Some(1.8));
        assert_eq!(input.savings_fraction, 0.50);
    }

    #[test]
    fn lead_input_uses_wider_bounds() {
        let input = Variant::Pocket
            .config()
            .lead_estimate_input(0.0, 0.0)
            .expect("valid input");
        assert_eq!(input.monthly_volume, 0.0);
        assert_eq!(input.current_rate_percent, 0.0);

        let input = Variant::Pocket
            .config()
            .lead_estimate_input(-5.0, 12.0)
            .expect("valid input");
        assert_eq!(input.monthly_volume, 0.0);
        assert_eq!(input.current_rate_percent, 10.0);
    }

    #[test]
    fn residual_input_requires_projection_variant() {
        let err = Variant::Tiered
            .config()
            .residual_input(Some(5), 100.0)
            .expect_err("tiered does not project");
        assert_eq!(err, InputError::ProjectionUnavailable(Variant::Tiered));
    }

    #[test]
    fn residual_input_clamps_deals_and_floors_residual() {
        let config = Variant::Residual.config();

        let input = config.residual_input(None, 75.0).expect("valid input");
        assert_eq!(input.deals_per_month, 4);
        assert_eq!(input.horizon_months, 36);

        let input = config.residual_input(Some(0), -10.0).expect("valid input");
        assert_eq!(input.deals_per_month, 1);
        assert_eq!(input.residual_per_merchant, 0.0);

        let input = config.residual_input(Some(99), 10.0).expect("valid input");
        assert_eq!(input.deals_per_month, 20);

        let input = config.residual_input(Some(-1), 10.0).expect("valid input");
        assert_eq!(input.deals_per_month, 1);
    }
}
