use super::strategy_config::{BacktestPeriod, RsiParams, SmaCrossoverParams, StrategyKind};
use crate::domain::errors::ConfigError;
use crate::domain::evolution::dna::Dna;
use serde::{Deserialize, Serialize};

/// Named interpretation of a genome used by the parallel evaluator.
/// Each family maps the same DNA onto a different backtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyFamily {
    Scalping,
    Swing,
    MeanReversion,
    AdaptiveRegime,
}

impl StrategyFamily {
    pub const ALL: [StrategyFamily; 4] = [
        StrategyFamily::Scalping,
        StrategyFamily::Swing,
        StrategyFamily::MeanReversion,
        StrategyFamily::AdaptiveRegime,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyFamily::Scalping => "scalping",
            StrategyFamily::Swing => "swing",
            StrategyFamily::MeanReversion => "mean_reversion",
            StrategyFamily::AdaptiveRegime => "adaptive_regime",
        }
    }

    pub fn period(&self) -> BacktestPeriod {
        match self {
            StrategyFamily::Scalping => BacktestPeriod::ThreeMonths,
            StrategyFamily::Swing | StrategyFamily::MeanReversion => BacktestPeriod::OneYear,
            StrategyFamily::AdaptiveRegime => BacktestPeriod::TwoYears,
        }
    }

    pub fn interpret(&self, dna: &Dna) -> StrategyKind {
        match self {
            StrategyFamily::Scalping => {
                // Halved windows for a short horizon
                let fast_period = (dna.ma_fast() / 2).max(2);
                let slow_period = (dna.ma_slow() / 2).max(fast_period + 1);
                StrategyKind::SmaCrossover(SmaCrossoverParams {
                    fast_period,
                    slow_period,
                })
            }
            StrategyFamily::Swing => StrategyKind::SmaCrossover(SmaCrossoverParams {
                fast_period: dna.ma_fast(),
                slow_period: dna.ma_slow(),
            }),
            StrategyFamily::MeanReversion => StrategyKind::RsiStrategy(RsiParams {
                period: dna.rsi_period(),
                overbought: dna.rsi_overbought() as f64,
                oversold: dna.rsi_oversold() as f64,
            }),
            StrategyFamily::AdaptiveRegime => StrategyKind::EvolutionDna(dna.clone()),
        }
    }
}

impl std::str::FromStr for StrategyFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scalping" => Ok(StrategyFamily::Scalping),
            "swing" => Ok(StrategyFamily::Swing),
            "mean_reversion" => Ok(StrategyFamily::MeanReversion),
            "adaptive_regime" => Ok(StrategyFamily::AdaptiveRegime),
            _ => Err(ConfigError::UnknownFamily(s.to_string())),
        }
    }
}

impl std::fmt::Display for StrategyFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evolution::dna::DnaParams;

    #[test]
    fn test_scalping_halves_windows_and_keeps_order() {
        let dna = Dna::new(DnaParams {
            ma_fast: 3,
            ma_slow: 5,
            ..DnaParams::default()
        })
        .unwrap();

        match StrategyFamily::Scalping.interpret(&dna) {
            StrategyKind::SmaCrossover(p) => {
                assert_eq!(p.fast_period, 2);
                assert_eq!(p.slow_period, 3);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_every_family_yields_valid_kind() {
        let dna = Dna::default();
        for family in StrategyFamily::ALL {
            assert!(family.interpret(&dna).validate().is_ok(), "{}", family);
        }
    }

    #[test]
    fn test_parse_family() {
        assert_eq!("Swing".parse(), Ok(StrategyFamily::Swing));
        assert!("momentum".parse::<StrategyFamily>().is_err());
    }
}
