//! Content-addressed cache for daily load scores
//!
//! Entries are keyed by calendar day and validated by a SHA-256 fingerprint of
//! the inputs that produced them: the day's contributors and symptoms (sorted,
//! compared by value), the previous day's decayed load and the configuration.
//! A stored score is only reused when the fingerprint of the current call
//! matches, so date equality alone never returns a stale result.
//!
//! Invalidation semantics:
//! - [`LoadScoreCache::invalidate`] drops one day and does NOT cascade. Later
//!   days stay cached until their own fingerprint stops matching.
//! - [`LoadScoreCache::invalidate_from`] drops the day and everything after it,
//!   forcing the whole dependent chain to be recomputed.
//!
//! The cache is a plain owned value with `&mut self` methods. Callers sharing
//! one instance across threads wrap it in a [`SharedLoadScoreCache`] and hold
//! the lock for the whole range walk.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, trace, warn};

use crate::calculator::LoadCalculator;
use crate::config::LoadConfig;
use crate::models::{
    today, ActivityContributor, ContributorsByDate, LoadScore, SymptomContribution,
    SymptomsByDate,
};

/// Cache instance shared between callers; lock it around each get/set sequence
pub type SharedLoadScoreCache = Arc<Mutex<LoadScoreCache>>;

/// SHA-256 digest over a calculation's inputs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint the inputs of one day's calculation
    ///
    /// Collections are sorted by value first, so reordered or reconstructed
    /// inputs with equal values produce the same fingerprint. Decimals are
    /// normalized, so `1.0` and `1.00` are the same input.
    pub fn compute(
        contributors: &[ActivityContributor],
        symptoms: &[SymptomContribution],
        previous_load: Decimal,
        config: &LoadConfig,
    ) -> Self {
        let mut contributor_keys: Vec<String> = contributors
            .iter()
            .map(|c| {
                format!(
                    "{}|{}|{}|{}",
                    canonical(c.physical),
                    canonical(c.cognitive),
                    canonical(c.emotional),
                    canonical(c.duration_minutes)
                )
            })
            .collect();
        contributor_keys.sort();

        let mut symptom_keys: Vec<String> = symptoms.iter().map(|s| canonical(s.severity)).collect();
        symptom_keys.sort();

        let mut hasher = Sha256::new();

        hasher.update(format!("contributors:{}\n", contributor_keys.len()));
        for key in &contributor_keys {
            hasher.update(key.as_bytes());
            hasher.update(b"\n");
        }

        hasher.update(format!("symptoms:{}\n", symptom_keys.len()));
        for key in &symptom_keys {
            hasher.update(key.as_bytes());
            hasher.update(b"\n");
        }

        hasher.update(format!("previous:{}\n", canonical(previous_load)));

        let w = &config.weights;
        let t = &config.thresholds;
        hasher.update(format!(
            "config:{}|{}|{}|{}|{}|{}|{}|{}|{}\n",
            canonical(config.decay_factor),
            canonical(config.reference_duration_minutes),
            canonical(w.physical),
            canonical(w.cognitive),
            canonical(w.emotional),
            canonical(w.symptom),
            canonical(t.caution),
            canonical(t.warning),
            canonical(t.critical)
        ));

        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    /// Hex-encoded digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn canonical(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Cached score plus the fingerprint of the inputs that produced it
#[derive(Debug, Clone)]
struct CacheEntry {
    score: LoadScore,
    fingerprint: Fingerprint,
}

/// Snapshot of cache size and lookup counters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CacheStatistics {
    /// Distinct cached dates
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, or 0 before any lookup
    pub hit_rate: f64,
}

/// Per-day memoization layer in front of [`LoadCalculator`]
#[derive(Debug, Default)]
pub struct LoadScoreCache {
    entries: BTreeMap<NaiveDate, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl LoadScoreCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap this cache for use from several threads
    pub fn into_shared(self) -> SharedLoadScoreCache {
        Arc::new(Mutex::new(self))
    }

    /// Look up the score for `date`, counting a hit or a miss
    ///
    /// A stored entry whose fingerprint differs from these inputs is a miss and
    /// stays in place until the next [`set`](Self::set) for that date.
    pub fn get(
        &mut self,
        date: NaiveDate,
        contributors: &[ActivityContributor],
        symptoms: &[SymptomContribution],
        previous_load: Decimal,
        config: &LoadConfig,
    ) -> Option<LoadScore> {
        let fingerprint = Fingerprint::compute(contributors, symptoms, previous_load, config);

        match self.entries.get(&date) {
            Some(entry) if entry.fingerprint == fingerprint => {
                self.hits += 1;
                trace!(%date, "Load score cache hit");
                Some(entry.score.clone())
            }
            Some(_) => {
                self.misses += 1;
                trace!(%date, "Load score cache miss: inputs changed");
                None
            }
            None => {
                self.misses += 1;
                trace!(%date, "Load score cache miss: no entry");
                None
            }
        }
    }

    /// Store `score` for `date`, replacing any previous entry
    pub fn set(
        &mut self,
        score: LoadScore,
        date: NaiveDate,
        contributors: &[ActivityContributor],
        symptoms: &[SymptomContribution],
        previous_load: Decimal,
        config: &LoadConfig,
    ) {
        let fingerprint = Fingerprint::compute(contributors, symptoms, previous_load, config);
        self.entries.insert(date, CacheEntry { score, fingerprint });
    }

    /// Scores for every day from `from` to `to` inclusive, in ascending order
    ///
    /// The decay chain starts at zero on `from`. Each day is served from the
    /// cache when its fingerprint matches and computed and stored otherwise;
    /// either way its decayed load feeds the next day. Days missing from the
    /// input maps have no contributors or symptoms. An inverted range yields
    /// no scores.
    pub fn calculate_range(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
        contributors_by_date: &ContributorsByDate,
        symptoms_by_date: &SymptomsByDate,
        config: &LoadConfig,
    ) -> Vec<LoadScore> {
        if from > to {
            warn!(%from, %to, "Empty load score range: start is after end");
            return Vec::new();
        }

        let hits_before = self.hits;
        let misses_before = self.misses;

        let mut scores = Vec::with_capacity(((to - from).num_days() + 1) as usize);
        let mut previous_load = Decimal::ZERO;

        for date in from.iter_days().take_while(|d| *d <= to) {
            let contributors = contributors_by_date
                .get(&date)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let symptoms = symptoms_by_date
                .get(&date)
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let score = match self.get(date, contributors, symptoms, previous_load, config) {
                Some(cached) => cached,
                None => {
                    let computed =
                        LoadCalculator::calculate(date, contributors, symptoms, previous_load, config);
                    self.set(
                        computed.clone(),
                        date,
                        contributors,
                        symptoms,
                        previous_load,
                        config,
                    );
                    computed
                }
            };

            previous_load = score.decayed_load();
            scores.push(score);
        }

        debug!(
            %from,
            %to,
            days = scores.len(),
            hits = self.hits - hits_before,
            misses = self.misses - misses_before,
            "Calculated load score range"
        );

        scores
    }

    /// Remove the entry for `date` only; later days are left cached
    ///
    /// Returns whether an entry was removed.
    pub fn invalidate(&mut self, date: NaiveDate) -> bool {
        let removed = self.entries.remove(&date).is_some();
        if removed {
            info!(%date, "Invalidated cached load score");
        }
        removed
    }

    /// Remove the entry for `date` and every later entry
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_from(&mut self, date: NaiveDate) -> usize {
        let removed = self.entries.split_off(&date).len();
        info!(%date, removed, "Invalidated cached load scores from date");
        removed
    }

    /// Remove every entry; statistics are kept
    pub fn invalidate_all(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        info!(removed, "Load score cache cleared");
    }

    /// Remove entries dated before `today - days`, using the local calendar day
    pub fn prune_older_than(&mut self, days: u32) -> usize {
        self.prune_older_than_as_of(days, today())
    }

    /// Remove entries dated before `today - days`
    ///
    /// Returns the number of entries removed.
    pub fn prune_older_than_as_of(&mut self, days: u32, today: NaiveDate) -> usize {
        let Some(cutoff) = today.checked_sub_days(Days::new(u64::from(days))) else {
            return 0;
        };

        let before = self.entries.len();
        self.entries.retain(|date, _| *date >= cutoff);
        let removed = before - self.entries.len();

        if removed > 0 {
            info!(%cutoff, removed, "Pruned old load scores");
        }
        removed
    }

    /// Current entry count and lookup counters
    pub fn statistics(&self) -> CacheStatistics {
        let lookups = self.hits + self.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        };

        CacheStatistics {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate,
        }
    }

    /// Zero the hit and miss counters; entries are kept
    pub fn reset_statistics(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry, current or stale, exists for `date`
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.entries.contains_key(&date)
    }

    /// Cached dates in ascending order
    pub fn cached_dates(&self) -> Vec<NaiveDate> {
        self.entries.keys().copied().collect()
    }
}
