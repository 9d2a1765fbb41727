//! Configuration module for evotrade.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by domain: Evolution, Evaluator, Safety, and Data.

mod data_config;
mod evaluator_config;
mod evolution_config;
mod safety_config;

pub use data_config::{DataEnvConfig, DataSource};
pub use evaluator_config::EvaluatorEnvConfig;
pub use evolution_config::{EvolutionEnvConfig, EvolutionFileConfig};
pub use safety_config::SafetyEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub evolution: EvolutionEnvConfig,
    pub evaluator: EvaluatorEnvConfig,
    pub safety: SafetyEnvConfig,
    pub data: DataEnvConfig,
}

impl Config {
    /// Load from the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (the environment in production, a map in tests)
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let evolution =
            EvolutionEnvConfig::from_lookup(lookup).context("Failed to load evolution config")?;
        let evaluator =
            EvaluatorEnvConfig::from_lookup(lookup).context("Failed to load evaluator config")?;
        let safety = SafetyEnvConfig::from_lookup(lookup).context("Failed to load safety config")?;
        let data = DataEnvConfig::from_lookup(lookup).context("Failed to load data config")?;

        Ok(Self {
            evolution,
            evaluator,
            safety,
            data,
        })
    }
}

/// Parse `key` with `default` when unset
pub(crate) fn parse_or<T>(lookup: &dyn Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

/// Parse `key` when set, `None` otherwise
pub(crate) fn parse_opt<T>(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_value(key, &raw))
        .transpose()
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context(format!("Failed to parse {}={:?}", key, raw))
}


#[cfg(test)]
mod tests {
    use super::test_support::vars;
    use super::*;

    #[test]
    fn test_config_from_defaults() {
        let config = Config::from_lookup(&vars(&[])).expect("Should parse with defaults");
        assert_eq!(config.evolution.population_size, 20);
        assert_eq!(config.evaluator.max_workers, 3);
        assert_eq!(config.safety.max_consecutive_losses, 5);
        assert_eq!(config.data.source, DataSource::Synthetic);
    }

    #[test]
    fn test_bad_value_reports_key() {
        let err = Config::from_lookup(&vars(&[("EVALUATOR_MAX_WORKERS", "many")])).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("evaluator config"));
        assert!(msg.contains("EVALUATOR_MAX_WORKERS"));
    }

    #[test]
    fn test_parse_opt_treats_blank_as_unset() {
        let lookup = vars(&[("EVO_SEED", "  ")]);
        let seed: Option<u64> = parse_opt(&lookup, "EVO_SEED").unwrap();
        assert_eq!(seed, None);
    }
}
