use crate::domain::market::strategy_family::StrategyFamily;
use crate::domain::performance::metrics::PerformanceRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one generational step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation that was evaluated
    pub generation: u32,
    pub population_size: usize,
    pub best_fitness: f64,
    pub avg_fitness: f64,
    pub worst_fitness: f64,
    pub best_organism_id: String,
    pub evaluated: usize,
    pub failed_evaluations: usize,
    pub timestamp: DateTime<Utc>,
}

/// Result of one strategy-family backtest for one organism
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FamilyOutcome {
    Succeeded {
        family: StrategyFamily,
        record: PerformanceRecord,
        fitness: f64,
    },
    Failed {
        family: StrategyFamily,
        error: String,
    },
}

impl FamilyOutcome {
    pub fn family(&self) -> StrategyFamily {
        match self {
            FamilyOutcome::Succeeded { family, .. } | FamilyOutcome::Failed { family, .. } => {
                *family
            }
        }
    }

    pub fn fitness(&self) -> Option<f64> {
        match self {
            FamilyOutcome::Succeeded { fitness, .. } => Some(*fitness),
            FamilyOutcome::Failed { .. } => None,
        }
    }
}

/// Multi-family evaluation of a single organism
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganismTestReport {
    pub organism_id: String,
    pub generation: u32,
    pub families: Vec<FamilyOutcome>,
    /// Mean over successful families only (0 when none succeeded)
    pub average_fitness: f64,
    pub succeeded: usize,
    pub failed: usize,
    pub tested_at: DateTime<Utc>,
}

impl OrganismTestReport {
    pub fn from_outcomes(organism_id: String, generation: u32, families: Vec<FamilyOutcome>) -> Self {
        let scores: Vec<f64> = families.iter().filter_map(FamilyOutcome::fitness).collect();
        let succeeded = scores.len();
        let failed = families.len() - succeeded;
        let average_fitness = if succeeded > 0 {
            scores.iter().sum::<f64>() / succeeded as f64
        } else {
            0.0
        };

        Self {
            organism_id,
            generation,
            families,
            average_fitness,
            succeeded,
            failed,
            tested_at: Utc::now(),
        }
    }

    pub fn best_family(&self) -> Option<(StrategyFamily, f64)> {
        self.families
            .iter()
            .filter_map(|o| o.fitness().map(|f| (o.family(), f)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}
