//! Evolution configuration parsing from environment variables,
//! with optional overrides from a TOML file.

use super::{parse_opt, parse_or};
use crate::application::optimization::population::{EvaluationTarget, PopulationConfig};
use crate::domain::market::strategy_config::BacktestPeriod;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Evolution environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionEnvConfig {
    // Population
    pub population_size: usize,
    pub survival_rate: f64,
    pub elite_rate: f64,
    pub mutation_rate: f64,
    pub seed: Option<u64>,

    // Run length (None = until shutdown)
    pub max_generations: Option<usize>,

    // Evaluation target
    pub symbol: String,
    pub period: BacktestPeriod,
    pub initial_capital: Decimal,
}

impl Default for EvolutionEnvConfig {
    fn default() -> Self {
        let population = PopulationConfig::default();
        let target = EvaluationTarget::default();
        Self {
            population_size: population.size,
            survival_rate: population.survival_rate,
            elite_rate: population.elite_rate,
            mutation_rate: population.mutation_rate,
            seed: None,
            max_generations: None,
            symbol: target.symbol,
            period: target.period,
            initial_capital: target.initial_capital,
        }
    }
}

/// Keys accepted in an evolution TOML file; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvolutionFileConfig {
    pub population_size: Option<usize>,
    pub survival_rate: Option<f64>,
    pub elite_rate: Option<f64>,
    pub mutation_rate: Option<f64>,
    pub seed: Option<u64>,
    pub max_generations: Option<usize>,
    pub symbol: Option<String>,
    pub period: Option<BacktestPeriod>,
    pub initial_capital: Option<Decimal>,
}

impl EvolutionEnvConfig {
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            population_size: parse_or(lookup, "EVO_POPULATION_SIZE", defaults.population_size)?,
            survival_rate: parse_or(lookup, "EVO_SURVIVAL_RATE", defaults.survival_rate)?,
            elite_rate: parse_or(lookup, "EVO_ELITE_RATE", defaults.elite_rate)?,
            mutation_rate: parse_or(lookup, "EVO_MUTATION_RATE", defaults.mutation_rate)?,
            seed: parse_opt(lookup, "EVO_SEED")?,
            max_generations: parse_opt(lookup, "EVO_MAX_GENERATIONS")?,
            symbol: lookup("EVO_SYMBOL").unwrap_or(defaults.symbol),
            period: parse_or(lookup, "EVO_PERIOD", defaults.period)?,
            initial_capital: parse_or(lookup, "INITIAL_CAPITAL", defaults.initial_capital)?,
        })
    }

    /// Apply every key present in the TOML file at `path`
    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read evolution config {:?}", path))?;
        let file: EvolutionFileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse evolution config {:?}", path))?;
        self.apply(file);
        Ok(())
    }

    pub fn apply(&mut self, file: EvolutionFileConfig) {
        if let Some(v) = file.population_size {
            self.population_size = v;
        }
        if let Some(v) = file.survival_rate {
            self.survival_rate = v;
        }
        if let Some(v) = file.elite_rate {
            self.elite_rate = v;
        }
        if let Some(v) = file.mutation_rate {
            self.mutation_rate = v;
        }
        if file.seed.is_some() {
            self.seed = file.seed;
        }
        if file.max_generations.is_some() {
            self.max_generations = file.max_generations;
        }
        if let Some(v) = file.symbol {
            self.symbol = v;
        }
        if let Some(v) = file.period {
            self.period = v;
        }
        if let Some(v) = file.initial_capital {
            self.initial_capital = v;
        }
    }

    pub fn to_population_config(&self) -> PopulationConfig {
        PopulationConfig {
            size: self.population_size,
            survival_rate: self.survival_rate,
            elite_rate: self.elite_rate,
            mutation_rate: self.mutation_rate,
            seed: self.seed,
        }
    }

    pub fn to_target(&self) -> EvaluationTarget {
        EvaluationTarget {
            symbol: self.symbol.to_uppercase(),
            period: self.period,
            initial_capital: self.initial_capital,
        }
    }
}
