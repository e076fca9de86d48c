//! Allostatic load calculation
//!
//! One step of a leaky integrator per calendar day:
//! `decayed_today = decayed_yesterday × decay_factor + raw_today`.
//! The calculator is stateless; threading yesterday's value through a date
//! range is the job of [`crate::cache::LoadScoreCache::calculate_range`].
//!
//! The carried term is truncated to [`CARRY_SCALE`] decimal places, so an
//! idle chain strictly decreases and reaches exactly zero.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::{LoadConfig, RiskThresholds};
use crate::models::{ActivityContributor, LoadScore, RiskLevel, SymptomContribution};

/// Decimal places kept in the load carried over from the previous day
pub const CARRY_SCALE: u32 = 10;

/// Stateless load score calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadCalculator;

impl LoadCalculator {
    /// Compute the score for `date` given that day's inputs and the previous day's decayed load
    ///
    /// Empty `contributors` and `symptoms` are valid and yield a raw load of zero.
    /// `previous_load` must be non-negative and `config` must pass
    /// [`LoadConfig::validate`]; both are checked in debug builds only.
    pub fn calculate(
        date: NaiveDate,
        contributors: &[ActivityContributor],
        symptoms: &[SymptomContribution],
        previous_load: Decimal,
        config: &LoadConfig,
    ) -> LoadScore {
        debug_assert!(
            previous_load >= Decimal::ZERO,
            "previous load must be non-negative, got {}",
            previous_load
        );
        debug_assert!(
            config.validate().is_ok(),
            "invalid load configuration: {:?}",
            config.validate()
        );

        let raw_load = Self::raw_load(contributors, symptoms, config);
        let carried = (previous_load * config.decay_factor)
            .round_dp_with_strategy(CARRY_SCALE, RoundingStrategy::ToZero);
        let decayed_load = carried + raw_load;
        let risk_level = Self::classify(decayed_load, &config.thresholds);

        LoadScore::new(date, raw_load, decayed_load, risk_level)
    }

    /// Weighted sum of the day's exertion and symptom contributions
    pub fn raw_load(
        contributors: &[ActivityContributor],
        symptoms: &[SymptomContribution],
        config: &LoadConfig,
    ) -> Decimal {
        let weights = &config.weights;

        let exertion: Decimal = contributors
            .iter()
            .map(|c| {
                let intensity = c.physical * weights.physical
                    + c.cognitive * weights.cognitive
                    + c.emotional * weights.emotional;
                intensity * (c.duration_minutes / config.reference_duration_minutes)
            })
            .sum();

        let symptom_load: Decimal = symptoms.iter().map(|s| s.severity * weights.symptom).sum();

        exertion + symptom_load
    }

    /// Bucket a decayed load against the configured thresholds
    ///
    /// A load exactly on a threshold belongs to the more severe level.
    pub fn classify(decayed_load: Decimal, thresholds: &RiskThresholds) -> RiskLevel {
        if decayed_load >= thresholds.critical {
            RiskLevel::Critical
        } else if decayed_load >= thresholds.warning {
            RiskLevel::Warning
        } else if decayed_load >= thresholds.caution {
            RiskLevel::Caution
        } else {
            RiskLevel::Normal
        }
    }
}
