use crate::domain::errors::{BacktestError, ConfigError};
use crate::domain::evolution::dna::Dna;
use serde::{Deserialize, Serialize};

/// Wire names of the strategy kinds the backtester understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyName {
    SmaCrossover,
    RsiStrategy,
    EvolutionDna,
}

impl std::str::FromStr for StrategyName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMA_CROSSOVER" => Ok(StrategyName::SmaCrossover),
            "RSI_STRATEGY" => Ok(StrategyName::RsiStrategy),
            "EVOLUTION_DNA" => Ok(StrategyName::EvolutionDna),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl std::fmt::Display for StrategyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyName::SmaCrossover => write!(f, "SMA_CROSSOVER"),
            StrategyName::RsiStrategy => write!(f, "RSI_STRATEGY"),
            StrategyName::EvolutionDna => write!(f, "EVOLUTION_DNA"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmaCrossoverParams {
    pub fast_period: u32,
    pub slow_period: u32,
}

impl Default for SmaCrossoverParams {
    fn default() -> Self {
        Self {
            fast_period: 10,
            slow_period: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiParams {
    pub period: u32,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 14,
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

/// A strategy kind together with its typed parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyKind {
    SmaCrossover(SmaCrossoverParams),
    RsiStrategy(RsiParams),
    EvolutionDna(Dna),
}

impl StrategyKind {
    pub fn name(&self) -> StrategyName {
        match self {
            StrategyKind::SmaCrossover(_) => StrategyName::SmaCrossover,
            StrategyKind::RsiStrategy(_) => StrategyName::RsiStrategy,
            StrategyKind::EvolutionDna(_) => StrategyName::EvolutionDna,
        }
    }

    /// Default parameters for a named kind. EVOLUTION_DNA uses the default genome.
    pub fn from_name(name: StrategyName) -> Self {
        match name {
            StrategyName::SmaCrossover => StrategyKind::SmaCrossover(SmaCrossoverParams::default()),
            StrategyName::RsiStrategy => StrategyKind::RsiStrategy(RsiParams::default()),
            StrategyName::EvolutionDna => StrategyKind::EvolutionDna(Dna::default()),
        }
    }

    /// Reject parameters that cannot produce a meaningful backtest
    pub fn validate(&self) -> Result<(), BacktestError> {
        match self {
            StrategyKind::SmaCrossover(p) => {
                if p.fast_period == 0 {
                    return Err(BacktestError::InvalidParameters(
                        "SMA fast period must be > 0".to_string(),
                    ));
                }
                if p.fast_period >= p.slow_period {
                    return Err(BacktestError::InvalidParameters(format!(
                        "SMA fast period ({}) must be below slow period ({})",
                        p.fast_period, p.slow_period
                    )));
                }
            }
            StrategyKind::RsiStrategy(p) => {
                if p.period == 0 {
                    return Err(BacktestError::InvalidParameters(
                        "RSI period must be > 0".to_string(),
                    ));
                }
                if !p.oversold.is_finite()
                    || !p.overbought.is_finite()
                    || p.oversold >= p.overbought
                {
                    return Err(BacktestError::InvalidParameters(format!(
                        "RSI oversold ({}) must be below overbought ({})",
                        p.oversold, p.overbought
                    )));
                }
            }
            // Dna is validated on construction
            StrategyKind::EvolutionDna(_) => {}
        }
        Ok(())
    }
}

/// Historical window requested from the market-data port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BacktestPeriod {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl BacktestPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BacktestPeriod::OneMonth => "1mo",
            BacktestPeriod::ThreeMonths => "3mo",
            BacktestPeriod::SixMonths => "6mo",
            BacktestPeriod::OneYear => "1y",
            BacktestPeriod::TwoYears => "2y",
            BacktestPeriod::FiveYears => "5y",
        }
    }

    /// Approximate number of daily bars in the window
    pub fn trading_days(&self) -> usize {
        match self {
            BacktestPeriod::OneMonth => 21,
            BacktestPeriod::ThreeMonths => 63,
            BacktestPeriod::SixMonths => 126,
            BacktestPeriod::OneYear => 252,
            BacktestPeriod::TwoYears => 504,
            BacktestPeriod::FiveYears => 1260,
        }
    }
}

impl std::str::FromStr for BacktestPeriod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1mo" => Ok(BacktestPeriod::OneMonth),
            "3mo" => Ok(BacktestPeriod::ThreeMonths),
            "6mo" => Ok(BacktestPeriod::SixMonths),
            "1y" => Ok(BacktestPeriod::OneYear),
            "2y" => Ok(BacktestPeriod::TwoYears),
            "5y" => Ok(BacktestPeriod::FiveYears),
            _ => Err(ConfigError::UnknownPeriod(s.to_string())),
        }
    }
}

impl std::fmt::Display for BacktestPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
