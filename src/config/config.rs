use std::str::FromStr;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use super::collector::CollectorConfig;
use super::logging::LoggingConfig;

/// Environment variable holding the path of the YAML config file.
pub const CONFIG_PATH_ENV: &str = "HOSTMETRICS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";
/// Prefix for per-field environment overrides, nested with `__`.
pub const ENV_PREFIX: &str = "HOSTMETRICS_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, Debug)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ConfigV1 {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ConfigV1 {
    fn default() -> Self {
        ConfigV1 {
            bind_address: default_bind_address(),
            logging: LoggingConfig::default(),
            collector: CollectorConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Figment(#[from] figment::Error),
    #[error("collector.cpu_sample_interval_ms must be greater than zero")]
    ZeroSampleInterval,
    #[error("invalid logging.level '{0}'. Valid values: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

impl ConfigV1 {
    /// Extracts and validates a config from an assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let Config::ConfigV1(config) = figment.extract::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collector.cpu_sample_interval_ms == 0 {
            return Err(ConfigError::ZeroSampleInterval);
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(self.logging.level.trim())
            .map_err(|_| ConfigError::InvalidLogLevel(self.logging.level.clone()))
    }
}

/// Built-in defaults only; file and environment layers go on top.
pub fn base_figment() -> Figment {
    Figment::new().merge(Serialized::defaults(Config::ConfigV1(ConfigV1::default())))
}

/// Defaults, then the YAML file at `path` (if present), then
/// `HOSTMETRICS_*` environment variables.
pub fn figment_for(path: &str) -> Figment {
    base_figment().merge(Yaml::file(path)).merge(
        Env::prefixed(ENV_PREFIX)
            .ignore(&["config"])
            .split("__"),
    )
}

/// Load config from the YAML file named by `HOSTMETRICS_CONFIG`, or
/// "config.yaml" in the current directory. Exits the process on error.
pub fn load_config() -> ConfigV1 {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    match ConfigV1::from_figment(figment_for(&path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}
