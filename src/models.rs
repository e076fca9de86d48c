use chrono::{DateTime, Local, NaiveDate, TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Activity contributors grouped by calendar day
pub type ContributorsByDate = BTreeMap<NaiveDate, Vec<ActivityContributor>>;

/// Symptom observations grouped by calendar day
pub type SymptomsByDate = BTreeMap<NaiveDate, Vec<SymptomContribution>>;

/// Ordered risk classification of accumulated load
///
/// Variant order is severity order, so `RiskLevel::Warning > RiskLevel::Caution`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Normal,
    Caution,
    Warning,
    Critical,
}

impl RiskLevel {
    /// All levels, least severe first
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Normal,
        RiskLevel::Caution,
        RiskLevel::Warning,
        RiskLevel::Critical,
    ];

    /// Get risk description
    pub fn description(&self) -> &'static str {
        match self {
            RiskLevel::Normal => "Load within usual capacity",
            RiskLevel::Caution => "Load building up",
            RiskLevel::Warning => "Load well above capacity",
            RiskLevel::Critical => "Load at crash risk",
        }
    }

    /// Get pacing recommendation
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::Normal => "Continue usual activity",
            RiskLevel::Caution => "Plan rest breaks and avoid stacking demanding tasks",
            RiskLevel::Warning => "Reduce exertion today and prioritize recovery",
            RiskLevel::Critical => "Rest now, postpone non-essential activity",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RiskLevel::Normal => "normal",
            RiskLevel::Caution => "caution",
            RiskLevel::Warning => "warning",
            RiskLevel::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// Load score for one calendar day
///
/// Only [`crate::calculator::LoadCalculator`] produces these; the fields are
/// read through accessors so a score cannot be altered after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadScore {
    date: NaiveDate,
    raw_load: Decimal,
    decayed_load: Decimal,
    risk_level: RiskLevel,
}

impl LoadScore {
    pub(crate) fn new(
        date: NaiveDate,
        raw_load: Decimal,
        decayed_load: Decimal,
        risk_level: RiskLevel,
    ) -> Self {
        LoadScore {
            date,
            raw_load,
            decayed_load,
            risk_level,
        }
    }

    /// Calendar day this score belongs to
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The day's own contribution before decay
    pub fn raw_load(&self) -> Decimal {
        self.raw_load
    }

    /// Raw load plus the decayed carry-over from prior days
    pub fn decayed_load(&self) -> Decimal {
        self.decayed_load
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    /// Portion of the decayed load inherited from earlier days
    pub fn carried_load(&self) -> Decimal {
        self.decayed_load - self.raw_load
    }
}

/// One physical/cognitive/emotional exertion event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityContributor {
    /// Physical exertion magnitude
    pub physical: Decimal,

    /// Cognitive exertion magnitude
    pub cognitive: Decimal,

    /// Emotional exertion magnitude
    pub emotional: Decimal,

    /// Duration of the activity in minutes
    pub duration_minutes: Decimal,
}

impl ActivityContributor {
    pub fn new(
        physical: Decimal,
        cognitive: Decimal,
        emotional: Decimal,
        duration_minutes: Decimal,
    ) -> Self {
        ActivityContributor {
            physical,
            cognitive,
            emotional,
            duration_minutes,
        }
    }
}

/// One symptom observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomContribution {
    /// Severity magnitude
    pub severity: Decimal,
}

impl SymptomContribution {
    pub fn new(severity: Decimal) -> Self {
        SymptomContribution { severity }
    }
}

/// Normalize an instant to the calendar day it falls on in its own timezone
pub fn calendar_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.date_naive()
}

/// Today's calendar day in local time
pub fn today() -> NaiveDate {
    calendar_day(&Local::now())
}
