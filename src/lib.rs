// Library interface for Allostat modules
// This allows integration tests and benchmarks to access the scoring engine

pub mod cache;
pub mod calculator;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod import;
pub mod logging;
pub mod models;
pub mod summary;

// Re-export commonly used types for convenience
pub use cache::{CacheStatistics, Fingerprint, LoadScoreCache, SharedLoadScoreCache};
pub use calculator::LoadCalculator;
pub use config::{AppConfig, LoadConfig, LoadWeights, RiskThresholds};
pub use error::{AllostatError, ConfigError, Result};
pub use history::{HistoricalValue, MetricHistoryCache};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use summary::{DaySummary, LoadSummary, TrendDirection};
