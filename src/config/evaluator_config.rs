use super::parse_or;
use crate::application::optimization::parallel_evaluator::EvaluatorConfig;
use crate::domain::market::strategy_family::StrategyFamily;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::time::Duration;

/// Parallel evaluator environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorEnvConfig {
    pub max_workers: usize,
    pub unit_timeout_secs: u64,
    pub families: Vec<StrategyFamily>,
}

impl Default for EvaluatorEnvConfig {
    fn default() -> Self {
        let defaults = EvaluatorConfig::default();
        Self {
            max_workers: defaults.max_workers,
            unit_timeout_secs: defaults.unit_timeout.as_secs(),
            families: defaults.families,
        }
    }
}

impl EvaluatorEnvConfig {
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let max_workers = parse_or(lookup, "EVALUATOR_MAX_WORKERS", defaults.max_workers)?;
        if max_workers == 0 {
            anyhow::bail!("EVALUATOR_MAX_WORKERS must be at least 1");
        }

        let families = match lookup("EVALUATOR_FAMILIES") {
            Some(raw) if !raw.trim().is_empty() => parse_families(&raw)
                .context(format!("Failed to parse EVALUATOR_FAMILIES={:?}", raw))?,
            _ => defaults.families,
        };

        Ok(Self {
            max_workers,
            unit_timeout_secs: parse_or(
                lookup,
                "EVALUATOR_TIMEOUT_SECS",
                defaults.unit_timeout_secs,
            )?,
            families,
        })
    }

    pub fn to_evaluator_config(&self, symbol: &str, initial_capital: Decimal) -> EvaluatorConfig {
        EvaluatorConfig {
            max_workers: self.max_workers,
            unit_timeout: Duration::from_secs(self.unit_timeout_secs),
            symbol: symbol.to_uppercase(),
            initial_capital,
            families: self.families.clone(),
        }
    }
}

/// Comma separated family names, duplicates dropped
fn parse_families(raw: &str) -> Result<Vec<StrategyFamily>> {
    let mut families = Vec::new();
    for name in raw.split(',').filter(|s| !s.trim().is_empty()) {
        let family: StrategyFamily = name.parse()?;
        if !families.contains(&family) {
            families.push(family);
        }
    }
    if families.is_empty() {
        anyhow::bail!("at least one strategy family is required");
    }
    Ok(families)
}
