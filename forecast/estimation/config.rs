use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use shared_logging::LogLevel;

use crate::{error::EstimationError, request::DEFAULT_SIMULATIONS};

/// Environment key overriding the per-dev-day rate.
pub const RATE_ENV_KEY: &str = "FORECAST_COST_RATE_PER_DEV_DAY";
/// Environment key overriding the currency label.
pub const CURRENCY_ENV_KEY: &str = "FORECAST_CURRENCY";

/// Monetary settings consumed by the cost estimator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CostConfig {
    /// Cost of one developer for one working day.
    #[serde(default = "default_rate")]
    pub rate_per_dev_day: f64,
    /// Currency label reported alongside costs.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl CostConfig {
    /// Creates a validated cost config.
    ///
    /// # Errors
    ///
    /// Same as [`Self::validate`].
    pub fn new(rate_per_dev_day: f64, currency: impl Into<String>) -> Result<Self, EstimationError> {
        let config = Self {
            rate_per_dev_day,
            currency: currency.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects non-positive or non-finite rates and blank currencies.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::Config`] describing the bad value.
    pub fn validate(&self) -> Result<(), EstimationError> {
        if !self.rate_per_dev_day.is_finite() || self.rate_per_dev_day <= 0.0 {
            return Err(EstimationError::Config(format!(
                "rate_per_dev_day must be positive, got {}",
                self.rate_per_dev_day
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(EstimationError::Config("currency must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            rate_per_dev_day: default_rate(),
            currency: default_currency(),
        }
    }
}

/// Simulation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationSettings {
    /// Sample count used when the caller does not pick one.
    #[serde(default = "default_samples")]
    pub default_samples: u32,
    /// Fixed seed for reproducible runs. Fresh entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            default_samples: default_samples(),
            seed: None,
        }
    }
}

/// Where telemetry goes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TelemetrySettings {
    /// JSON-lines log file.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    /// JSON-lines event file.
    #[serde(default)]
    pub event_log: Option<PathBuf>,
    /// Records below this level are dropped.
    #[serde(default = "default_level")]
    pub min_level: LogLevel,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_path: None,
            event_log: None,
            min_level: default_level(),
        }
    }
}

/// Top-level engine configuration document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Cost settings.
    #[serde(default)]
    pub cost: CostConfig,
    /// Simulation settings.
    #[serde(default)]
    pub simulation: SimulationSettings,
    /// Telemetry settings.
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Fails when the file is unreadable or its contents are rejected by [`Self::from_toml`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        let config = Self::from_toml(&raw).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or an invalid cost section.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        if config.simulation.default_samples == 0 {
            config.simulation.default_samples = default_samples();
        }
        config.cost.validate()?;
        Ok(config)
    }

    /// Applies rate/currency overrides from `lookup` (normally the process environment).
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::Config`] for an unparsable rate or when the
    /// overridden config fails validation.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), EstimationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(RATE_ENV_KEY) {
            self.cost.rate_per_dev_day = raw.trim().parse().map_err(|_| {
                EstimationError::Config(format!("{RATE_ENV_KEY} is not a number: {raw}"))
            })?;
        }
        if let Some(currency) = lookup(CURRENCY_ENV_KEY) {
            self.cost.currency = currency.trim().to_string();
        }
        self.cost.validate()
    }
}

const fn default_rate() -> f64 {
    500.0
}

fn default_currency() -> String {
    "USD".into()
}

const fn default_samples() -> u32 {
    DEFAULT_SIMULATIONS
}

const fn default_level() -> LogLevel {
    LogLevel::Info
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn empty_document_uses_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config.cost, CostConfig::default());
        assert!((config.cost.rate_per_dev_day - 500.0).abs() < f64::EPSILON);
        assert_eq!(config.cost.currency, "USD");
        assert_eq!(config.simulation.default_samples, 1000);
        assert_eq!(config.telemetry.min_level, LogLevel::Info);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forecast.toml");
        fs::write(
            &path,
            r#"
[cost]
rate_per_dev_day = 640.0
currency = "EUR"

[simulation]
default_samples = 5000
seed = 7

[telemetry]
log_path = "logs/forecast.log"
min_level = "WARN"
"#,
        )
        .unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.cost.currency, "EUR");
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.default_samples, 5000);
        assert_eq!(config.telemetry.min_level, LogLevel::Warn);
        assert_eq!(
            config.telemetry.log_path.as_deref(),
            Some(Path::new("logs/forecast.log"))
        );
    }

    #[test]
    fn rejects_non_positive_rate() {
        let err = EngineConfig::from_toml("[cost]\nrate_per_dev_day = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("rate_per_dev_day"));
    }

    #[test]
    fn env_overrides_apply_through_lookup() {
        let vars: HashMap<&str, &str> =
            HashMap::from([(RATE_ENV_KEY, " 725.5 "), (CURRENCY_ENV_KEY, "GBP")]);
        let mut config = EngineConfig::default();
        config
            .apply_env_overrides(|key| vars.get(key).map(|v| (*v).to_string()))
            .unwrap();
        assert!((config.cost.rate_per_dev_day - 725.5).abs() < f64::EPSILON);
        assert_eq!(config.cost.currency, "GBP");

        let err = config
            .apply_env_overrides(|key| (key == RATE_ENV_KEY).then(|| "cheap".to_string()))
            .unwrap_err();
        assert!(matches!(err, EstimationError::Config(_)));
    }
}
