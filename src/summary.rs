//! Read-only views over a computed score range
//!
//! [`DaySummary`] interprets a single day; [`LoadSummary`] aggregates a range
//! into peak, average, risk distribution and trend.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{LoadScore, RiskLevel};

/// Direction of decayed load across a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Stable,
    Decreasing,
}

impl TrendDirection {
    /// Compare two values with a 5% dead band
    pub fn between(start: Decimal, end: Decimal) -> Self {
        let change_threshold = dec!(0.05);
        let percent_change = (end - start) / start.abs().max(Decimal::ONE);

        if percent_change > change_threshold {
            TrendDirection::Increasing
        } else if percent_change < -change_threshold {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }
}

/// What a day-summary view shows for one score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub raw_load: Decimal,
    pub decayed_load: Decimal,
    pub risk_level: RiskLevel,
    pub description: &'static str,
    pub recommendation: &'static str,

    /// Fraction of the decayed load inherited from earlier days, 0 when there is no load
    pub carried_share: Decimal,
}

impl DaySummary {
    pub fn from_score(score: &LoadScore) -> Self {
        let carried_share = if score.decayed_load().is_zero() {
            Decimal::ZERO
        } else {
            score.carried_load() / score.decayed_load()
        };

        DaySummary {
            date: score.date(),
            raw_load: score.raw_load(),
            decayed_load: score.decayed_load(),
            risk_level: score.risk_level(),
            description: score.risk_level().description(),
            recommendation: score.risk_level().recommendation(),
            carried_share,
        }
    }
}

/// Aggregate view over a range of scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSummary {
    pub days: usize,
    pub peak_load: Decimal,
    pub peak_date: NaiveDate,
    pub average_load: Decimal,
    pub days_by_risk: BTreeMap<RiskLevel, usize>,

    /// Days at warning level or above
    pub elevated_days: usize,
    pub trend: TrendDirection,
}

impl LoadSummary {
    /// Summarize a score series; `None` for an empty series
    pub fn from_scores(scores: &[LoadScore]) -> Option<Self> {
        let first = scores.first()?;
        let last = scores.last()?;

        // Earliest day wins a tie for the peak
        let peak = scores.iter().fold(first, |peak, score| {
            if score.decayed_load() > peak.decayed_load() {
                score
            } else {
                peak
            }
        });

        let total: Decimal = scores.iter().map(LoadScore::decayed_load).sum();
        let average_load = total / Decimal::from(scores.len());

        let mut days_by_risk: BTreeMap<RiskLevel, usize> =
            RiskLevel::ALL.iter().map(|level| (*level, 0)).collect();
        for score in scores {
            *days_by_risk.entry(score.risk_level()).or_insert(0) += 1;
        }

        let elevated_days = scores
            .iter()
            .filter(|s| s.risk_level() >= RiskLevel::Warning)
            .count();

        Some(LoadSummary {
            days: scores.len(),
            peak_load: peak.decayed_load(),
            peak_date: peak.date(),
            average_load,
            days_by_risk,
            elevated_days,
            trend: TrendDirection::between(first.decayed_load(), last.decayed_load()),
        })
    }
}
