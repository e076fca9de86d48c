//! Per-metric historical value cache
//!
//! Stores one typed value per metric key and calendar day (resting heart
//! rate, step count, a free-text sleep note, ...). Values are a tagged union;
//! typed accessors return `None` on a type mismatch instead of coercing.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A single historical metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum HistoricalValue {
    Double(f64),
    Integer(i64),
    Text(String),
}

impl HistoricalValue {
    pub fn as_double(&self) -> Option<f64> {
        match self {
            HistoricalValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            HistoricalValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            HistoricalValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for HistoricalValue {
    fn from(value: f64) -> Self {
        HistoricalValue::Double(value)
    }
}

impl From<i64> for HistoricalValue {
    fn from(value: i64) -> Self {
        HistoricalValue::Integer(value)
    }
}

impl From<String> for HistoricalValue {
    fn from(value: String) -> Self {
        HistoricalValue::Text(value)
    }
}

impl From<&str> for HistoricalValue {
    fn from(value: &str) -> Self {
        HistoricalValue::Text(value.to_string())
    }
}

/// Historical values keyed by metric, then by day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricHistoryCache {
    metrics: HashMap<String, BTreeMap<NaiveDate, HistoricalValue>>,
}

impl MetricHistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, returning the one it replaced
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        date: NaiveDate,
        value: impl Into<HistoricalValue>,
    ) -> Option<HistoricalValue> {
        self.metrics
            .entry(key.into())
            .or_default()
            .insert(date, value.into())
    }

    pub fn get(&self, key: &str, date: NaiveDate) -> Option<&HistoricalValue> {
        self.metrics.get(key)?.get(&date)
    }

    pub fn get_double(&self, key: &str, date: NaiveDate) -> Option<f64> {
        self.get(key, date)?.as_double()
    }

    pub fn get_integer(&self, key: &str, date: NaiveDate) -> Option<i64> {
        self.get(key, date)?.as_integer()
    }

    pub fn get_text(&self, key: &str, date: NaiveDate) -> Option<&str> {
        self.get(key, date)?.as_text()
    }

    /// Most recent value recorded for `key`
    pub fn latest(&self, key: &str) -> Option<(NaiveDate, &HistoricalValue)> {
        self.metrics
            .get(key)?
            .iter()
            .next_back()
            .map(|(date, value)| (*date, value))
    }

    /// Values for `key` between `from` and `to` inclusive, oldest first
    pub fn series(
        &self,
        key: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<(NaiveDate, &HistoricalValue)> {
        if from > to {
            return Vec::new();
        }
        self.metrics
            .get(key)
            .map(|values| {
                values
                    .range(from..=to)
                    .map(|(date, value)| (*date, value))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop every value stored for `key`
    pub fn remove_metric(&mut self, key: &str) -> bool {
        self.metrics.remove(key).is_some()
    }

    /// Drop values dated before `today - days` across all metrics
    pub fn prune_older_than_as_of(&mut self, days: u32, today: NaiveDate) -> usize {
        let Some(cutoff) = today.checked_sub_days(Days::new(u64::from(days))) else {
            return 0;
        };

        let mut removed = 0;
        for values in self.metrics.values_mut() {
            let kept = values.split_off(&cutoff);
            removed += values.len();
            *values = kept;
        }
        self.metrics.retain(|_, values| !values.is_empty());

        if removed > 0 {
            debug!(%cutoff, removed, "Pruned metric history");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.metrics.clear();
    }

    /// Number of metrics with at least one stored value
    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }
}
