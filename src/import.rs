//! CSV import of per-day activity contributors and symptom observations
//!
//! Expected layouts (header row required, extra columns ignored):
//! - contributors: `date,physical,cognitive,emotional,duration_minutes`
//! - symptoms: `date,severity`
//!
//! Dates are calendar days (`YYYY-MM-DD`). Several rows may share a date.
//! Every magnitude must lie in `0..=MAX_MAGNITUDE`.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::error::{AllostatError, Result};
use crate::models::{ActivityContributor, ContributorsByDate, SymptomContribution, SymptomsByDate};

/// Largest accepted value for any imported field
///
/// Keeps the weighted daily sums far below `Decimal::MAX`.
pub const MAX_MAGNITUDE: Decimal = dec!(1000000);

#[derive(Debug, Deserialize)]
struct ContributorRecord {
    date: NaiveDate,
    physical: Decimal,
    cognitive: Decimal,
    emotional: Decimal,
    duration_minutes: Decimal,
}

#[derive(Debug, Deserialize)]
struct SymptomRecord {
    date: NaiveDate,
    severity: Decimal,
}

/// Load activity contributors grouped by day
pub fn load_contributors(path: &Path) -> Result<ContributorsByDate> {
    let mut by_date = ContributorsByDate::new();
    let rows = read_records::<ContributorRecord>(path)?;
    let count = rows.len();

    for (line, record) in rows {
        let fields = [
            ("physical", record.physical),
            ("cognitive", record.cognitive),
            ("emotional", record.emotional),
            ("duration_minutes", record.duration_minutes),
        ];
        for (name, value) in fields {
            check_magnitude(path, line, name, value)?;
        }

        by_date.entry(record.date).or_default().push(ActivityContributor::new(
            record.physical,
            record.cognitive,
            record.emotional,
            record.duration_minutes,
        ));
    }

    info!(path = %path.display(), rows = count, days = by_date.len(), "Imported activity contributors");
    Ok(by_date)
}

/// Load symptom observations grouped by day
pub fn load_symptoms(path: &Path) -> Result<SymptomsByDate> {
    let mut by_date = SymptomsByDate::new();
    let rows = read_records::<SymptomRecord>(path)?;
    let count = rows.len();

    for (line, record) in rows {
        check_magnitude(path, line, "severity", record.severity)?;
        by_date
            .entry(record.date)
            .or_default()
            .push(SymptomContribution::new(record.severity));
    }

    info!(path = %path.display(), rows = count, days = by_date.len(), "Imported symptoms");
    Ok(by_date)
}

/// Deserialize every row, pairing each record with its line number
fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<(u64, T)>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();

    let mut raw = StringRecord::new();
    let mut records = Vec::new();
    while reader.read_record(&mut raw).map_err(|e| csv_error(path, e))? {
        let line = raw.position().map(|p| p.line()).unwrap_or(0);
        let record: T = raw
            .deserialize(Some(&headers))
            .map_err(|e| import_error(path, line, e.to_string()))?;
        records.push((line, record));
    }
    Ok(records)
}

fn check_magnitude(path: &Path, line: u64, name: &str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(import_error(path, line, format!("{} must be non-negative, got {}", name, value)));
    }
    if value > MAX_MAGNITUDE {
        return Err(import_error(
            path,
            line,
            format!("{} must be at most {}, got {}", name, MAX_MAGNITUDE, value),
        ));
    }
    Ok(())
}

fn csv_error(path: &Path, err: csv::Error) -> AllostatError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => AllostatError::Io(io),
        _ => import_error(path, line, reason),
    }
}

fn import_error(path: &Path, line: u64, reason: String) -> AllostatError {
    AllostatError::Import {
        path: path.to_path_buf(),
        line,
        reason,
    }
}
