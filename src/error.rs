//! Unified error hierarchy for Allostat
//!
//! The calculator and cache never fail under valid inputs. These errors cover
//! the outer surface: configuration loading, CSV import and score export.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all Allostat operations
#[derive(Debug, Error)]
pub enum AllostatError {
    /// Invalid load configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed input file
    #[error("Import error in {path} (line {line}): {reason}")]
    Import {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// Export failed
    #[error("Export failed to {path}: {reason}")]
    Export { path: PathBuf, reason: String },

    /// Scores could not be encoded for an output stream
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Requested range ends before it starts
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load configuration validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Decay factor outside [0, 1)
    #[error("decay factor must be in [0, 1), got {value}")]
    DecayFactorOutOfRange { value: String },

    /// A weight coefficient is negative
    #[error("weight `{name}` must be non-negative, got {value}")]
    NegativeWeight { name: &'static str, value: String },

    /// Reference duration must be strictly positive
    #[error("reference duration must be positive, got {value} minutes")]
    NonPositiveReferenceDuration { value: String },

    /// Thresholds must be non-negative and ascending
    #[error("risk thresholds must satisfy 0 <= caution <= warning <= critical")]
    UnorderedThresholds,
}

/// Result type alias for Allostat operations
pub type Result<T> = std::result::Result<T, AllostatError>;

impl AllostatError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AllostatError::Config(_) => ErrorSeverity::Error,
            AllostatError::Import { .. } => ErrorSeverity::Warning,
            AllostatError::InvalidDateRange { .. } => ErrorSeverity::Warning,
            AllostatError::Export { .. } => ErrorSeverity::Error,
            AllostatError::Serialization(_) => ErrorSeverity::Error,
            AllostatError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AllostatError::Config(err) => {
                format!("Load configuration is invalid ({}). Fix the config file or run `allostat config --init`.", err)
            }
            AllostatError::Import { path, line, .. } => {
                format!("Could not read {} at line {}. Check the column layout.", path.display(), line)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
