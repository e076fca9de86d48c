use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::logging::LogConfig;

/// Load scoring configuration
///
/// Passed by reference into every calculation; two configurations with equal
/// fields are interchangeable for caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Fraction of yesterday's decayed load carried into today, in [0, 1)
    pub decay_factor: Decimal,

    /// Activity duration that counts as one full unit of exertion
    pub reference_duration_minutes: Decimal,

    /// Per-dimension weight coefficients
    pub weights: LoadWeights,

    /// Lower bounds of the risk categories
    pub thresholds: RiskThresholds,
}

/// Weight coefficients applied to each exertion dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadWeights {
    pub physical: Decimal,
    pub cognitive: Decimal,
    pub emotional: Decimal,
    pub symptom: Decimal,
}

/// Decayed load lower bounds for each non-normal risk level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub caution: Decimal,
    pub warning: Decimal,
    pub critical: Decimal,
}

impl Default for LoadConfig {
    fn default() -> Self {
        LoadConfig {
            decay_factor: dec!(0.7),
            reference_duration_minutes: dec!(60),
            weights: LoadWeights::default(),
            thresholds: RiskThresholds::default(),
        }
    }
}

impl Default for LoadWeights {
    fn default() -> Self {
        LoadWeights {
            physical: dec!(1.0),
            cognitive: dec!(0.8),
            emotional: dec!(0.9),
            symptom: dec!(1.5),
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            caution: dec!(10),
            warning: dec!(20),
            critical: dec!(35),
        }
    }
}

impl LoadConfig {
    /// Check the configuration against the calculator's preconditions
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.decay_factor < Decimal::ZERO || self.decay_factor >= Decimal::ONE {
            return Err(ConfigError::DecayFactorOutOfRange {
                value: self.decay_factor.to_string(),
            });
        }

        let weights = [
            ("physical", self.weights.physical),
            ("cognitive", self.weights.cognitive),
            ("emotional", self.weights.emotional),
            ("symptom", self.weights.symptom),
        ];
        for (name, value) in weights {
            if value < Decimal::ZERO {
                return Err(ConfigError::NegativeWeight {
                    name,
                    value: value.to_string(),
                });
            }
        }

        if self.reference_duration_minutes <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveReferenceDuration {
                value: self.reference_duration_minutes.to_string(),
            });
        }

        let t = &self.thresholds;
        if t.caution < Decimal::ZERO || t.caution > t.warning || t.warning > t.critical {
            return Err(ConfigError::UnorderedThresholds);
        }

        Ok(())
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Load scoring parameters
    pub load: LoadConfig,

    /// Logging settings
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();
        AppConfig {
            metadata: ConfigMetadata {
                version: "1".to_string(),
                created_at: now,
                updated_at: now,
            },
            load: LoadConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config
            .load
            .validate()
            .with_context(|| format!("Invalid load settings in {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("allostat")
            .join("config.toml")
    }

    /// Load configuration from `path` (or the default location), falling back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from_file(&config_path)
    }
}
