use crate::application::optimization::simulator::Backtester;
use crate::domain::errors::ConfigError;
use crate::domain::evolution::organism::{Organism, new_id};
use crate::domain::evolution::report::GenerationStats;
use crate::domain::market::strategy_config::{BacktestPeriod, StrategyKind};
use crate::domain::performance::fitness::calculate_fitness;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Smallest population that can keep two distinct survivors plus an elite
pub const MIN_POPULATION_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub size: usize,
    pub survival_rate: f64,
    pub elite_rate: f64,
    pub mutation_rate: f64,
    /// Fixed seed for reproducible runs; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 20,
            survival_rate: 0.5,
            elite_rate: 0.1,
            mutation_rate: 0.10,
            seed: None,
        }
    }
}

impl PopulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size < MIN_POPULATION_SIZE {
            return Err(ConfigError::PopulationTooSmall {
                size: self.size,
                min: MIN_POPULATION_SIZE,
            });
        }
        for (name, value) in [
            ("survival_rate", self.survival_rate),
            ("elite_rate", self.elite_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidRate { name, value });
            }
        }
        Ok(())
    }

    /// Top-ranked organisms allowed to breed (at least 2)
    pub fn survivor_count(&self) -> usize {
        ((self.size as f64 * self.survival_rate).floor() as usize).clamp(2, self.size)
    }

    /// Top-ranked organisms copied unchanged (at least 1, never more than the survivors)
    pub fn elite_count(&self) -> usize {
        ((self.size as f64 * self.elite_rate).floor() as usize).clamp(1, self.survivor_count())
    }
}

/// Market the population is scored against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTarget {
    pub symbol: String,
    pub period: BacktestPeriod,
    pub initial_capital: Decimal,
}

impl Default for EvaluationTarget {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            period: BacktestPeriod::OneYear,
            initial_capital: Decimal::from(100_000),
        }
    }
}

/// Fixed-size set of organisms driven through generational steps
pub struct Population {
    config: PopulationConfig,
    target: EvaluationTarget,
    backtester: Backtester,
    organisms: Vec<Organism>,
    generation: u32,
    rng: StdRng,
}

impl Population {
    pub fn new(
        config: PopulationConfig,
        target: EvaluationTarget,
        backtester: Backtester,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let organisms = (0..config.size)
            .map(|_| {
                let id = new_id(&mut rng);
                Organism::create_random(0, id, &mut rng)
            })
            .collect();

        info!(
            "Population: initialized {} organisms for {} ({})",
            config.size, target.symbol, target.period
        );

        Ok(Self {
            config,
            target,
            backtester,
            organisms,
            generation: 0,
            rng,
        })
    }

    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    pub fn target(&self) -> &EvaluationTarget {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.organisms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organisms.is_empty()
    }

    /// Score every organism with EVOLUTION_DNA against the target series.
    /// Failures only zero the affected fitness. Returns the failure count.
    pub async fn evaluate(&mut self) -> usize {
        let bars = match self
            .backtester
            .fetch_series(&self.target.symbol, self.target.period)
            .await
        {
            Ok(bars) => bars,
            Err(e) => {
                warn!(
                    "Population: generation {} unscored, {}",
                    self.generation, e
                );
                for organism in &mut self.organisms {
                    organism.fitness = 0.0;
                }
                return self.organisms.len();
            }
        };

        let kinds: Vec<StrategyKind> = self
            .organisms
            .iter()
            .map(|o| StrategyKind::EvolutionDna(o.dna.clone()))
            .collect();
        let capital = self.target.initial_capital;

        // CPU-bound: fan out on rayon off the async runtime
        let scored = tokio::task::spawn_blocking(move || {
            kinds
                .par_iter()
                .map(|kind| {
                    Backtester::simulate(&bars, kind, capital)
                        .map(|record| calculate_fitness(&record))
                        .map_err(|e| e.to_string())
                })
                .collect::<Vec<_>>()
        })
        .await;

        let results = match scored {
            Ok(results) => results,
            Err(e) => {
                warn!("Population: evaluation worker failed: {}", e);
                for organism in &mut self.organisms {
                    organism.fitness = 0.0;
                }
                return self.organisms.len();
            }
        };

        let mut failed = 0;
        for (organism, result) in self.organisms.iter_mut().zip(results) {
            organism.fitness = match result {
                Ok(fitness) => fitness,
                Err(reason) => {
                    failed += 1;
                    debug!("Population: organism {} failed: {}", organism.id, reason);
                    0.0
                }
            };
        }
        failed
    }

    /// One generational step: evaluate, rank, keep elites, breed survivors.
    /// The returned stats describe the generation that was evaluated.
    pub async fn evolve(&mut self) -> GenerationStats {
        let failed = self.evaluate().await;

        self.organisms
            .sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let stats = self.stats(failed);
        info!(
            "Gen {}: best={:.4} avg={:.4} worst={:.4} failed={}",
            stats.generation, stats.best_fitness, stats.avg_fitness, stats.worst_fitness, failed
        );

        let survivors = self.config.survivor_count();
        let elites = self.config.elite_count();
        let next_generation = self.generation + 1;

        let mut next: Vec<Organism> = self.organisms[..elites].to_vec();
        while next.len() < self.config.size {
            let (i, j) = distinct_pair(survivors, &mut self.rng);
            let id = new_id(&mut self.rng);
            let mut child =
                self.organisms[i].crossover(&self.organisms[j], id, &mut self.rng);
            child.mutate(self.config.mutation_rate, &mut self.rng);
            child.generation = next_generation;
            next.push(child);
        }

        self.organisms = next;
        self.generation = next_generation;
        stats
    }

    /// Highest-fitness organism, earliest on ties. After `evolve` this is the top elite.
    pub fn get_best_organism(&self) -> Option<&Organism> {
        self.organisms
            .iter()
            .reduce(|best, o| if o.fitness > best.fitness { o } else { best })
    }

    fn stats(&self, failed: usize) -> GenerationStats {
        let n = self.organisms.len();
        let fitness: Vec<f64> = self.organisms.iter().map(|o| o.fitness).collect();
        let best = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let worst = fitness.iter().copied().fold(f64::INFINITY, f64::min);
        let avg = if n > 0 {
            fitness.iter().sum::<f64>() / n as f64
        } else {
            0.0
        };

        GenerationStats {
            generation: self.generation,
            population_size: n,
            best_fitness: if n > 0 { best } else { 0.0 },
            avg_fitness: avg,
            worst_fitness: if n > 0 { worst } else { 0.0 },
            best_organism_id: self
                .get_best_organism()
                .map(|o| o.id.clone())
                .unwrap_or_default(),
            evaluated: n - failed.min(n),
            failed_evaluations: failed,
            timestamp: Utc::now(),
        }
    }
}

/// Two distinct indices in `0..n` (n ≥ 2)
fn distinct_pair<R: Rng + ?Sized>(n: usize, rng: &mut R) -> (usize, usize) {
    let i = rng.random_range(0..n);
    let mut j = rng.random_range(0..n - 1);
    if j >= i {
        j += 1;
    }
    (i, j)
}
