use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::core::{PairingError, StrategyRegistry};
use crate::models::Criterion;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default = "default_strategy")]
    pub default_strategy: String,
    /// Per-strategy overrides, keyed by strategy name
    #[serde(default)]
    pub tuning: HashMap<String, StrategyTuning>,
    #[serde(default = "default_batch_limit")]
    pub max_batch_results: usize,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            default_strategy: default_strategy(),
            tuning: HashMap::new(),
            max_batch_results: default_batch_limit(),
        }
    }
}

fn default_strategy() -> String { "revised".to_string() }
fn default_batch_limit() -> usize { 1000 }

/// Weight and sigma overrides, keyed by criterion name
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyTuning {
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    #[serde(default)]
    pub sigma: HashMap<String, f64>,
}

impl StrategyTuning {
    fn parse(values: &HashMap<String, f64>) -> Result<Vec<(Criterion, f64)>, PairingError> {
        values
            .iter()
            .map(|(name, value)| Ok((name.parse::<Criterion>()?, *value)))
            .collect()
    }
}

impl ScoringSettings {
    /// Build the strategy registry with all tuning applied and validated
    pub fn build_registry(&self) -> Result<StrategyRegistry, PairingError> {
        let mut registry = StrategyRegistry::builtin(&self.default_strategy)?;

        for (name, tuning) in &self.tuning {
            let weights = StrategyTuning::parse(&tuning.weights)?;
            let sigma = StrategyTuning::parse(&tuning.sigma)?;
            registry.tune(name, &weights, &sigma)?;
        }

        Ok(registry)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration files (config/default.toml, config/local.toml)
    /// 3. Environment variables (prefixed with PAIRING__)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local overrides for development
            .add_source(File::with_name("config/local").required(false))
            // e.g., PAIRING__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("PAIRING")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.scoring.default_strategy, "revised");
        assert!(settings.scoring.tuning.is_empty());
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.logging.format, "json");
    }

    #[test]
    fn test_default_registry() {
        let registry = ScoringSettings::default().build_registry().unwrap();
        assert_eq!(registry.default_name(), "revised");
    }

    #[test]
    fn test_tuning_from_toml() {
        let scoring: ScoringSettings = toml::from_str(
            r#"
default_strategy = "original"

[tuning.original.weights]
distance = 2.0

[tuning.original.sigma]
fayalite_content = 0.8
"#,
        )
        .unwrap();

        let registry = scoring.build_registry().unwrap();
        let original = registry.get("original").unwrap();
        assert_eq!(registry.default_name(), "original");
        assert_eq!(original.weight(Criterion::Distance), Some(2.0));
        assert_eq!(original.sigma(Criterion::FayaliteContent).unwrap(), 0.8);
    }

    #[test]
    fn test_tuning_unknown_criterion() {
        let mut scoring = ScoringSettings::default();
        scoring.tuning.insert(
            "revised".to_string(),
            StrategyTuning {
                weights: HashMap::from([("colour".to_string(), 1.0)]),
                sigma: HashMap::new(),
            },
        );

        let err = scoring.build_registry().unwrap_err();
        assert!(matches!(err, PairingError::UnknownCriterion { .. }));
    }

    #[test]
    fn test_tuning_unknown_strategy() {
        let mut scoring = ScoringSettings::default();
        scoring.tuning.insert("bespoke".to_string(), StrategyTuning::default());

        let err = scoring.build_registry().unwrap_err();
        assert!(matches!(err, PairingError::UnknownStrategy { .. }));
    }
}
