//! Integration tests for the load score cache
//!
//! Tests cache behavior including:
//! - Fingerprint-validated hits and misses
//! - Decay chain threading across a range
//! - Point and forward invalidation
//! - Pruning by age
//! - Statistics bookkeeping

use allostat::cache::LoadScoreCache;
use allostat::calculator::LoadCalculator;
use allostat::config::LoadConfig;
use allostat::models::{
    ActivityContributor, ContributorsByDate, LoadScore, SymptomContribution, SymptomsByDate,
};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::thread;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn contributor(physical: Decimal) -> ActivityContributor {
    ActivityContributor::new(physical, dec!(2), dec!(1), dec!(60))
}

/// Ten days of mixed activity and symptoms, January 1st to 10th
fn ten_day_inputs() -> (ContributorsByDate, SymptomsByDate) {
    let mut contributors = ContributorsByDate::new();
    let mut symptoms = SymptomsByDate::new();

    for day in 1..=10 {
        if day % 3 != 0 {
            contributors.insert(date(day), vec![contributor(Decimal::from(day))]);
        }
        if day % 2 == 0 {
            symptoms.insert(date(day), vec![SymptomContribution::new(dec!(2))]);
        }
    }

    (contributors, symptoms)
}

fn warm_cache(cache: &mut LoadScoreCache) -> Vec<LoadScore> {
    let (contributors, symptoms) = ten_day_inputs();
    let scores = cache.calculate_range(date(1), date(10), &contributors, &symptoms, &LoadConfig::default());
    cache.reset_statistics();
    scores
}

#[test]
fn test_fingerprint_sensitivity() {
    let config = LoadConfig::default();
    let mut cache = LoadScoreCache::new();
    let contributors = vec![contributor(dec!(3))];
    let symptoms = vec![SymptomContribution::new(dec!(4))];
    let previous = dec!(5);

    let score = LoadCalculator::calculate(date(1), &contributors, &symptoms, previous, &config);
    cache.set(score, date(1), &contributors, &symptoms, previous, &config);

    // Changed symptom severity
    let changed_symptoms = vec![SymptomContribution::new(dec!(4.5))];
    assert!(cache.get(date(1), &contributors, &changed_symptoms, previous, &config).is_none());

    // Changed exertion value
    let changed_contributors = vec![ActivityContributor::new(dec!(3), dec!(2), dec!(1.5), dec!(60))];
    assert!(cache.get(date(1), &changed_contributors, &symptoms, previous, &config).is_none());

    // Changed duration
    let longer = vec![ActivityContributor::new(dec!(3), dec!(2), dec!(1), dec!(61))];
    assert!(cache.get(date(1), &longer, &symptoms, previous, &config).is_none());

    // Changed previous load
    assert!(cache.get(date(1), &contributors, &symptoms, dec!(5.01), &config).is_none());

    // Changed configuration
    let other_config = LoadConfig {
        decay_factor: dec!(0.6),
        ..LoadConfig::default()
    };
    assert!(cache.get(date(1), &contributors, &symptoms, previous, &other_config).is_none());

    // Original inputs still hit
    assert!(cache.get(date(1), &contributors, &symptoms, previous, &config).is_some());

    let stats = cache.statistics();
    assert_eq!(stats.misses, 5);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);
}

#[test]
fn test_reconstructed_inputs_hit() {
    let mut cache = LoadScoreCache::new();
    let contributors = vec![contributor(dec!(1)), contributor(dec!(7))];
    let symptoms = vec![SymptomContribution::new(dec!(2)), SymptomContribution::new(dec!(6))];

    let score = LoadCalculator::calculate(date(2), &contributors, &symptoms, dec!(1), &LoadConfig::default());
    cache.set(score.clone(), date(2), &contributors, &symptoms, dec!(1), &LoadConfig::default());

    // Fresh, reordered copies and a separately built but equal config
    let reordered_contributors = vec![contributor(dec!(7)), contributor(dec!(1))];
    let reordered_symptoms = vec![SymptomContribution::new(dec!(6)), SymptomContribution::new(dec!(2))];
    let rebuilt_config = LoadConfig::default();

    assert_eq!(
        cache.get(date(2), &reordered_contributors, &reordered_symptoms, dec!(1), &rebuilt_config),
        Some(score)
    );
}

#[test]
fn test_stale_entry_survives_until_set() {
    let config = LoadConfig::default();
    let mut cache = LoadScoreCache::new();
    let original = vec![SymptomContribution::new(dec!(1))];
    let edited = vec![SymptomContribution::new(dec!(8))];

    let score = LoadCalculator::calculate(date(3), &[], &original, Decimal::ZERO, &config);
    cache.set(score.clone(), date(3), &[], &original, Decimal::ZERO, &config);

    assert!(cache.get(date(3), &[], &edited, Decimal::ZERO, &config).is_none());
    assert_eq!(cache.statistics().entries, 1);
    // The stale entry is still valid for its own inputs
    assert_eq!(cache.get(date(3), &[], &original, Decimal::ZERO, &config), Some(score));

    let replacement = LoadCalculator::calculate(date(3), &[], &edited, Decimal::ZERO, &config);
    cache.set(replacement.clone(), date(3), &[], &edited, Decimal::ZERO, &config);
    assert_eq!(cache.get(date(3), &[], &edited, Decimal::ZERO, &config), Some(replacement));
    assert!(cache.get(date(3), &[], &original, Decimal::ZERO, &config).is_none());
}

#[test]
fn test_range_completeness() {
    let mut cache = LoadScoreCache::new();
    let (contributors, symptoms) = ten_day_inputs();

    let scores = cache.calculate_range(date(1), date(10), &contributors, &symptoms, &LoadConfig::default());

    assert_eq!(scores.len(), 10);
    for (i, score) in scores.iter().enumerate() {
        assert_eq!(score.date(), date(i as u32 + 1));
    }
    assert!(scores.windows(2).all(|w| w[0].date() < w[1].date()));
}

#[test]
fn test_range_across_month_boundary() {
    let mut cache = LoadScoreCache::new();
    let from = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
    let to = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();

    let scores = cache.calculate_range(
        from,
        to,
        &ContributorsByDate::new(),
        &SymptomsByDate::new(),
        &LoadConfig::default(),
    );

    // 2024 is a leap year: Feb 27, 28, 29, Mar 1, 2
    assert_eq!(scores.len(), 5);
    assert_eq!(scores[2].date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
}

#[test]
fn test_range_threads_decay_chain() {
    let config = LoadConfig::default();
    let mut cache = LoadScoreCache::new();
    let (contributors, symptoms) = ten_day_inputs();

    let scores = cache.calculate_range(date(1), date(10), &contributors, &symptoms, &config);

    let mut previous = Decimal::ZERO;
    for score in &scores {
        let day_contributors = contributors.get(&score.date()).cloned().unwrap_or_default();
        let day_symptoms = symptoms.get(&score.date()).cloned().unwrap_or_default();
        let expected = LoadCalculator::calculate(score.date(), &day_contributors, &day_symptoms, previous, &config);

        assert_eq!(score, &expected);
        previous = expected.decayed_load();
    }
}

#[test]
fn test_decay_monotonicity() {
    let config = LoadConfig::default();
    let mut cache = LoadScoreCache::new();

    let mut symptoms = SymptomsByDate::new();
    symptoms.insert(date(1), vec![SymptomContribution::new(dec!(9)), SymptomContribution::new(dec!(7))]);
    let mut contributors = ContributorsByDate::new();
    contributors.insert(date(1), vec![ActivityContributor::new(dec!(8), dec!(6), dec!(7), dec!(180))]);

    let scores = cache.calculate_range(date(1), date(15), &contributors, &symptoms, &config);

    assert!(scores[0].decayed_load() > Decimal::ZERO);
    for pair in scores.windows(2) {
        assert!(pair[1].decayed_load() < pair[0].decayed_load());
        assert!(pair[1].decayed_load() > Decimal::ZERO);
        assert_eq!(pair[1].raw_load(), Decimal::ZERO);
    }
    assert!(scores[14].decayed_load() < scores[0].decayed_load() / dec!(100));
}

#[test]
fn test_idle_year_decays_to_zero() {
    let config = LoadConfig::default();
    let mut cache = LoadScoreCache::new();

    let mut symptoms = SymptomsByDate::new();
    symptoms.insert(date(1), vec![SymptomContribution::new(dec!(20))]);

    let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    let scores = cache.calculate_range(date(1), end, &ContributorsByDate::new(), &symptoms, &config);

    assert_eq!(scores.len(), 366);
    for pair in scores.windows(2) {
        let (before, after) = (pair[0].decayed_load(), pair[1].decayed_load());
        if before.is_zero() {
            assert!(after.is_zero());
        } else {
            assert!(after < before, "{} did not decay below {}", pair[1].date(), before);
        }
    }
    assert_eq!(scores[365].decayed_load(), Decimal::ZERO);
}

#[test]
fn test_cache_reuse_idempotence() {
    let config = LoadConfig::default();
    let mut cache = LoadScoreCache::new();
    let (contributors, symptoms) = ten_day_inputs();

    let first = cache.calculate_range(date(1), date(10), &contributors, &symptoms, &config);
    let after_first = cache.statistics();
    assert_eq!(after_first.misses, 10);
    assert_eq!(after_first.hits, 0);

    let second = cache.calculate_range(date(1), date(10), &contributors, &symptoms, &config);
    let after_second = cache.statistics();

    assert_eq!(first, second);
    assert_eq!(after_second.misses, 10);
    assert_eq!(after_second.hits, 10);
}

#[test]
fn test_point_invalidation_locality() {
    let config = LoadConfig::default();
    let mut cache = LoadScoreCache::new();
    let (contributors, symptoms) = ten_day_inputs();
    let first = warm_cache(&mut cache);

    assert!(cache.invalidate(date(5)));
    assert_eq!(cache.statistics().entries, 9);

    let second = cache.calculate_range(date(1), date(10), &contributors, &symptoms, &config);
    let stats = cache.statistics();

    // Only day 5 recomputes; its inputs are unchanged so later days still hit
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 9);
    assert_eq!(first, second);
}

#[test]
fn test_point_invalidation_does_not_cascade() {
    let config = LoadConfig::default();
    let mut cache = LoadScoreCache::new();
    let (contributors, _) = ten_day_inputs();
    warm_cache(&mut cache);

    // Day 4 gains a symptom and is invalidated on its own
    let (_, mut symptoms) = ten_day_inputs();
    symptoms.entry(date(4)).or_default().push(SymptomContribution::new(dec!(5)));
    cache.invalidate(date(4));

    assert!(cache.contains(date(5)));
    assert!(cache.contains(date(10)));

    let scores = cache.calculate_range(date(1), date(10), &contributors, &symptoms, &config);

    // Day 4 recomputes with a higher load; day 5's previous load changed so its
    // fingerprint misses, and the changed value ripples through every later day
    let stats = cache.statistics();
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.misses, 7);
    assert_eq!(scores.len(), 10);
}

#[test]
fn test_forward_invalidation_cascade() {
    let config = LoadConfig::default();
    let mut cache = LoadScoreCache::new();
    let (contributors, symptoms) = ten_day_inputs();
    let first = warm_cache(&mut cache);

    assert_eq!(cache.invalidate_from(date(7)), 4);
    assert_eq!(cache.statistics().entries, 6);
    for day in 7..=10 {
        assert!(!cache.contains(date(day)));
    }

    let second = cache.calculate_range(date(1), date(10), &contributors, &symptoms, &config);
    let stats = cache.statistics();

    assert_eq!(stats.hits, 6);
    assert_eq!(stats.misses, 4);
    assert_eq!(first, second);
}

#[test]
fn test_invalidate_all_keeps_statistics() {
    let config = LoadConfig::default();
    let mut cache = LoadScoreCache::new();
    let (contributors, symptoms) = ten_day_inputs();

    cache.calculate_range(date(1), date(10), &contributors, &symptoms, &config);
    cache.invalidate_all();

    let stats = cache.statistics();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.misses, 10);
    assert!(cache.is_empty());
}

#[test]
fn test_reset_statistics_keeps_entries() {
    let mut cache = LoadScoreCache::new();
    warm_cache(&mut cache);

    let stats = cache.statistics();
    assert_eq!(stats.entries, 10);
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.hit_rate, 0.0);
}

#[test]
fn test_pruning_by_age() {
    let config = LoadConfig::default();
    let mut cache = LoadScoreCache::new();
    let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
    let old = today.checked_sub_days(Days::new(150)).unwrap();
    let recent = today.checked_sub_days(Days::new(5)).unwrap();

    for day in [old, recent] {
        let score = LoadCalculator::calculate(day, &[], &[], Decimal::ZERO, &config);
        cache.set(score, day, &[], &[], Decimal::ZERO, &config);
    }
    cache.get(old, &[], &[], Decimal::ZERO, &config);
    assert_eq!(cache.statistics().entries, 2);

    assert_eq!(cache.prune_older_than_as_of(120, today), 1);

    let stats = cache.statistics();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(cache.cached_dates(), vec![recent]);
}

#[test]
fn test_pruning_relative_to_local_today() {
    let config = LoadConfig::default();
    let mut cache = LoadScoreCache::new();
    let today = allostat::models::today();

    for offset in [150, 5] {
        let day = today.checked_sub_days(Days::new(offset)).unwrap();
        let score = LoadCalculator::calculate(day, &[], &[], Decimal::ZERO, &config);
        cache.set(score, day, &[], &[], Decimal::ZERO, &config);
    }

    cache.prune_older_than(120);
    assert_eq!(cache.statistics().entries, 1);
}

#[test]
fn test_hit_rate_arithmetic() {
    let config = LoadConfig::default();
    let mut cache = LoadScoreCache::new();
    let m = 6;

    for day in 1..=m {
        let symptoms = vec![SymptomContribution::new(Decimal::from(day))];
        assert!(cache.get(date(day), &[], &symptoms, Decimal::ZERO, &config).is_none());
        let score = LoadCalculator::calculate(date(day), &[], &symptoms, Decimal::ZERO, &config);
        cache.set(score, date(day), &[], &symptoms, Decimal::ZERO, &config);
    }
    for day in 1..=m {
        let symptoms = vec![SymptomContribution::new(Decimal::from(day))];
        assert!(cache.get(date(day), &[], &symptoms, Decimal::ZERO, &config).is_some());
    }

    let stats = cache.statistics();
    assert_eq!(stats.hits, u64::from(m));
    assert_eq!(stats.misses, u64::from(m));
    assert_eq!(stats.entries, m as usize);
    assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_config_change_recomputes_range() {
    let mut cache = LoadScoreCache::new();
    let (contributors, symptoms) = ten_day_inputs();
    let first = warm_cache(&mut cache);

    let no_memory = LoadConfig {
        decay_factor: Decimal::ZERO,
        ..LoadConfig::default()
    };
    let second = cache.calculate_range(date(1), date(10), &contributors, &symptoms, &no_memory);

    assert_eq!(cache.statistics().misses, 10);
    for (score, earlier) in second.iter().zip(&first) {
        assert_eq!(score.decayed_load(), score.raw_load());
        assert!(score.decayed_load() <= earlier.decayed_load());
    }
}

#[test]
fn test_shared_cache_across_threads() {
    let shared = LoadScoreCache::new().into_shared();
    let (contributors, symptoms) = ten_day_inputs();
    let config = LoadConfig::default();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = shared.clone();
            let contributors = contributors.clone();
            let symptoms = symptoms.clone();
            let config = config.clone();
            thread::spawn(move || {
                let mut guard = cache.lock().unwrap();
                guard.calculate_range(date(1), date(10), &contributors, &symptoms, &config)
            })
        })
        .collect();

    let results: Vec<Vec<LoadScore>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));

    let stats = shared.lock().unwrap().statistics();
    assert_eq!(stats.misses, 10);
    assert_eq!(stats.hits, 30);
}
