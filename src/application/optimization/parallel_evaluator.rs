use crate::application::optimization::simulator::Backtester;
use crate::domain::errors::EvaluationError;
use crate::domain::evolution::organism::Organism;
use crate::domain::evolution::report::{FamilyOutcome, OrganismTestReport};
use crate::domain::market::strategy_family::StrategyFamily;
use crate::domain::performance::fitness::calculate_fitness;
use crate::domain::performance::metrics::PerformanceRecord;
use crate::domain::ports::ResultsSink;
use crate::infrastructure::observability::Metrics;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorConfig {
    pub max_workers: usize,
    pub unit_timeout: Duration,
    pub symbol: String,
    pub initial_capital: Decimal,
    pub families: Vec<StrategyFamily>,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_workers: 3,
            unit_timeout: Duration::from_secs(300),
            symbol: "SPY".to_string(),
            initial_capital: Decimal::from(100_000),
            families: StrategyFamily::ALL.to_vec(),
        }
    }
}

/// Result of one unit of work (one organism across all families)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnitOutcome {
    Completed(OrganismTestReport),
    TimedOut { organism_id: String, timeout_secs: u64 },
    Failed { organism_id: String, error: String },
}

impl UnitOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            UnitOutcome::Completed(_) => "completed",
            UnitOutcome::TimedOut { .. } => "timed_out",
            UnitOutcome::Failed { .. } => "failed",
        }
    }

    pub fn report(&self) -> Option<&OrganismTestReport> {
        match self {
            UnitOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Aggregate of a population test run, in input order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationTestSummary {
    pub outcomes: Vec<UnitOutcome>,
    pub completed: usize,
    pub timed_out: usize,
    pub failed: usize,
}

impl PopulationTestSummary {
    pub fn from_outcomes(outcomes: Vec<UnitOutcome>) -> Self {
        let count = |label: &str| outcomes.iter().filter(|o| o.label() == label).count();
        Self {
            completed: count("completed"),
            timed_out: count("timed_out"),
            failed: count("failed"),
            outcomes,
        }
    }

    /// Completed reports, best average fitness first
    pub fn ranked(&self) -> Vec<&OrganismTestReport> {
        let mut reports: Vec<&OrganismTestReport> =
            self.outcomes.iter().filter_map(UnitOutcome::report).collect();
        reports.sort_by(|a, b| b.average_fitness.total_cmp(&a.average_fitness));
        reports
    }

    pub fn best(&self) -> Option<&OrganismTestReport> {
        self.ranked().into_iter().next()
    }
}

/// Scores organisms under several strategy-family interpretations at once
#[derive(Clone)]
pub struct ParallelEvaluator {
    backtester: Backtester,
    config: Arc<EvaluatorConfig>,
    sink: Option<Arc<dyn ResultsSink>>,
    metrics: Option<Metrics>,
}

impl ParallelEvaluator {
    pub fn new(backtester: Backtester, config: EvaluatorConfig) -> Self {
        Self {
            backtester,
            config: Arc::new(config),
            sink: None,
            metrics: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResultsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Backtest one organism under every configured family.
    /// A failing family is recorded and excluded from the average.
    pub async fn test_organism(&self, organism: &Organism) -> OrganismTestReport {
        self.test_organism_in_slot(organism, None).await
    }

    async fn test_organism_in_slot(
        &self,
        organism: &Organism,
        slot: Option<Arc<OwnedSemaphorePermit>>,
    ) -> OrganismTestReport {
        let mut outcomes = Vec::with_capacity(self.config.families.len());

        for &family in &self.config.families {
            let outcome = match self.run_family(organism, family, slot.clone()).await {
                Ok((record, fitness)) => FamilyOutcome::Succeeded {
                    family,
                    record,
                    fitness,
                },
                Err(e) => {
                    warn!(
                        "ParallelEvaluator: {} failed for {}: {}",
                        family, organism.id, e
                    );
                    FamilyOutcome::Failed {
                        family,
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let report =
            OrganismTestReport::from_outcomes(organism.id.clone(), organism.generation, outcomes);
        info!(
            "ParallelEvaluator: {} avg fitness {:.4} ({} ok, {} failed)",
            report.organism_id, report.average_fitness, report.succeeded, report.failed
        );
        report
    }

    async fn run_family(
        &self,
        organism: &Organism,
        family: StrategyFamily,
        slot: Option<Arc<OwnedSemaphorePermit>>,
    ) -> Result<(PerformanceRecord, f64), EvaluationError> {
        let kind = family.interpret(&organism.dna);
        kind.validate()?;
        let bars = self
            .backtester
            .fetch_series(&self.config.symbol, family.period())
            .await?;
        let capital = self.config.initial_capital;

        let record = spawn_blocking_in_slot(slot, move || Backtester::simulate(&bars, &kind, capital))
            .await
            .map_err(|e| EvaluationError::WorkerFailed {
                organism_id: organism.id.clone(),
                reason: e.to_string(),
            })??;

        let fitness = calculate_fitness(&record);
        Ok((record, fitness))
    }

    /// Evaluate many organisms with at most `max_workers` units in flight.
    /// Each unit gets its own timeout once it holds a worker slot; a hung or
    /// crashed unit is reported and never stalls the rest of the batch.
    /// A timed-out unit keeps its slot until its in-progress simulation returns,
    /// so CPU-bound work never exceeds `max_workers`.
    pub async fn test_population(
        &self,
        organisms: &[Organism],
        max_workers: usize,
    ) -> PopulationTestSummary {
        let workers = max_workers.max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        let timeout = self.config.unit_timeout;
        let mut set = JoinSet::new();

        info!(
            "ParallelEvaluator: testing {} organisms with {} workers (timeout {:?})",
            organisms.len(),
            workers,
            timeout
        );

        for (index, organism) in organisms.iter().cloned().enumerate() {
            let semaphore = semaphore.clone();
            let evaluator = self.clone();

            set.spawn(async move {
                let organism_id = organism.id.clone();
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => Arc::new(permit),
                    Err(e) => {
                        return (
                            index,
                            UnitOutcome::Failed {
                                organism_id,
                                error: e.to_string(),
                            },
                        );
                    }
                };

                let slot = permit.clone();
                let mut handle = tokio::spawn(async move {
                    evaluator.test_organism_in_slot(&organism, Some(slot)).await
                });
                let outcome = match tokio::time::timeout(timeout, &mut handle).await {
                    Ok(Ok(report)) => UnitOutcome::Completed(report),
                    Ok(Err(join_err)) => {
                        let err = EvaluationError::WorkerFailed {
                            organism_id: organism_id.clone(),
                            reason: join_err.to_string(),
                        };
                        warn!("ParallelEvaluator: {}", err);
                        UnitOutcome::Failed {
                            organism_id,
                            error: err.to_string(),
                        }
                    }
                    Err(_) => {
                        handle.abort();
                        let err = EvaluationError::Timeout {
                            organism_id: organism_id.clone(),
                            timeout_secs: timeout.as_secs(),
                        };
                        warn!("ParallelEvaluator: {}", err);
                        UnitOutcome::TimedOut {
                            organism_id,
                            timeout_secs: timeout.as_secs(),
                        }
                    }
                };
                drop(permit);
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<UnitOutcome>> = (0..organisms.len()).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => warn!("ParallelEvaluator: unit task lost: {}", e),
            }
        }

        let outcomes: Vec<UnitOutcome> = slots
            .into_iter()
            .zip(organisms)
            .map(|(slot, organism)| {
                slot.unwrap_or_else(|| UnitOutcome::Failed {
                    organism_id: organism.id.clone(),
                    error: "unit task lost".to_string(),
                })
            })
            .collect();

        for outcome in &outcomes {
            if let Some(metrics) = &self.metrics {
                metrics.inc_evaluator_unit(outcome.label());
                match outcome {
                    UnitOutcome::TimedOut { .. } => metrics.inc_evaluation_failures("timeout", 1),
                    UnitOutcome::Failed { .. } => metrics.inc_evaluation_failures("worker", 1),
                    UnitOutcome::Completed(_) => {}
                }
            }
            if let (Some(sink), UnitOutcome::Completed(report)) = (&self.sink, outcome) {
                if let Err(e) = sink.record_test_report(report).await {
                    warn!(
                        "ParallelEvaluator: failed to record report for {}: {:#}",
                        report.organism_id, e
                    );
                }
            }
        }

        let summary = PopulationTestSummary::from_outcomes(outcomes);
        info!(
            "ParallelEvaluator: {} completed, {} timed out, {} failed",
            summary.completed, summary.timed_out, summary.failed
        );
        summary
    }
}

/// Runs CPU-bound work on the blocking pool. Blocking threads ignore `abort`,
/// so the worker slot travels with the closure and is released when it returns.
async fn spawn_blocking_in_slot<T, F>(
    slot: Option<Arc<OwnedSemaphorePermit>>,
    work: F,
) -> Result<T, JoinError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let _slot = slot;
        work()
    })
    .await
}
