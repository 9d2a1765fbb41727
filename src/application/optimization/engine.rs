//! Evolution engine driving a population over many generations.
//!
//! Tracks the best organism ever seen and hands every generation's stats to a
//! results sink. Stops at the generation limit or when shutdown is signalled.

use crate::application::optimization::population::Population;
use crate::domain::evolution::organism::Organism;
use crate::domain::evolution::report::GenerationStats;
use crate::domain::ports::ResultsSink;
use crate::infrastructure::observability::Metrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{info, warn};

/// Outcome of an evolution run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionSummary {
    pub generations_run: usize,
    pub best_ever: Option<Organism>,
    pub last_stats: Option<GenerationStats>,
    pub stopped_by_shutdown: bool,
}

pub struct EvolutionEngine {
    population: Population,
    sink: Arc<dyn ResultsSink>,
    metrics: Option<Metrics>,
    shutdown: Option<watch::Receiver<bool>>,
    best_ever: Option<Organism>,
}

impl EvolutionEngine {
    pub fn new(population: Population, sink: Arc<dyn ResultsSink>) -> Self {
        Self {
            population,
            sink,
            metrics: None,
            shutdown: None,
            best_ever: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Stop before the next generation once `true` is sent
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn best_ever(&self) -> Option<&Organism> {
        self.best_ever.as_ref()
    }

    /// Run `max_generations` steps, or until shutdown when `None`
    pub async fn run(&mut self, max_generations: Option<usize>) -> EvolutionSummary {
        info!(
            "EvolutionEngine: starting at generation {} (limit: {})",
            self.population.generation(),
            max_generations.map_or_else(|| "none".to_string(), |g| g.to_string())
        );

        let mut generations_run = 0;
        let mut last_stats = None;
        let mut stopped_by_shutdown = false;

        loop {
            if max_generations.is_some_and(|max| generations_run >= max) {
                break;
            }
            if self.shutdown_requested() {
                info!("EvolutionEngine: shutdown requested, stopping");
                stopped_by_shutdown = true;
                break;
            }

            let started = Instant::now();
            let stats = self.population.evolve().await;
            generations_run += 1;

            self.update_best_ever();
            self.observe(&stats, started.elapsed().as_secs_f64());

            if let Err(e) = self.sink.record_generation(&stats).await {
                warn!(
                    "EvolutionEngine: failed to record generation {}: {:#}",
                    stats.generation, e
                );
            }
            last_stats = Some(stats);

            // Unbounded runs must still let other tasks flip the shutdown flag
            tokio::task::yield_now().await;
        }

        if let Some(best) = &self.best_ever {
            info!(
                "EvolutionEngine: done after {} generations, best ever {} (gen {}, fitness {:.4})",
                generations_run, best.id, best.generation, best.fitness
            );
        }

        EvolutionSummary {
            generations_run,
            best_ever: self.best_ever.clone(),
            last_stats,
            stopped_by_shutdown,
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    fn update_best_ever(&mut self) {
        let Some(best) = self.population.get_best_organism() else {
            return;
        };
        let improved = self
            .best_ever
            .as_ref()
            .is_none_or(|current| best.fitness > current.fitness);
        if improved {
            self.best_ever = Some(best.clone());
        }
    }

    fn observe(&self, stats: &GenerationStats, elapsed_secs: f64) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        metrics.generations_total.inc();
        metrics.best_fitness.set(stats.best_fitness);
        metrics.avg_fitness.set(stats.avg_fitness);
        metrics.generation_duration_seconds.observe(elapsed_secs);
        if stats.failed_evaluations > 0 {
            metrics.inc_evaluation_failures("backtest", stats.failed_evaluations as u64);
        }
    }
}
