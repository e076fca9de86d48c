//! Score export as CSV or JSON
//!
//! Both formats share one flat row layout with loads rounded to four decimal
//! places. Writers target a file path or any [`Write`] sink such as stdout.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{AllostatError, Result};
use crate::models::{LoadScore, RiskLevel};

/// Flat row layout shared by the CSV and JSON writers
#[derive(Debug, Serialize)]
struct ScoreRow {
    date: NaiveDate,
    raw_load: Decimal,
    decayed_load: Decimal,
    risk_level: RiskLevel,
}

impl From<&LoadScore> for ScoreRow {
    fn from(score: &LoadScore) -> Self {
        ScoreRow {
            date: score.date(),
            raw_load: score.raw_load().round_dp(4).normalize(),
            decayed_load: score.decayed_load().round_dp(4).normalize(),
            risk_level: score.risk_level(),
        }
    }
}

/// Write scores as a pretty-printed JSON array to any writer
pub fn write_scores_json_to<W: Write>(scores: &[LoadScore], mut writer: W) -> Result<()> {
    let rows: Vec<ScoreRow> = scores.iter().map(ScoreRow::from).collect();

    serde_json::to_writer_pretty(&mut writer, &rows).map_err(|e| {
        if e.is_io() {
            AllostatError::Io(e.into())
        } else {
            AllostatError::Serialization(e.to_string())
        }
    })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write scores as CSV with a header row to any writer
pub fn write_scores_csv_to<W: Write>(scores: &[LoadScore], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for score in scores {
        writer.serialize(ScoreRow::from(score)).map_err(|e| {
            let reason = e.to_string();
            match e.into_kind() {
                csv::ErrorKind::Io(io) => AllostatError::Io(io),
                _ => AllostatError::Serialization(reason),
            }
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Write scores as a pretty-printed JSON array to `path`
pub fn write_scores_json(scores: &[LoadScore], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| export_error(path, e))?;
    write_scores_json_to(scores, BufWriter::new(file)).map_err(|e| export_error(path, e))?;

    tracing::info!(path = %path.display(), days = scores.len(), "Exported load scores as JSON");
    Ok(())
}

/// Write scores as CSV with a header row to `path`
pub fn write_scores_csv(scores: &[LoadScore], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| export_error(path, e))?;
    write_scores_csv_to(scores, BufWriter::new(file)).map_err(|e| export_error(path, e))?;

    tracing::info!(path = %path.display(), days = scores.len(), "Exported load scores as CSV");
    Ok(())
}

fn export_error(path: &Path, err: impl std::fmt::Display) -> AllostatError {
    AllostatError::Export {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
