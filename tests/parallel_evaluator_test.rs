mod common;

use anyhow::Result;
use async_trait::async_trait;
use evotrade::application::optimization::parallel_evaluator::{
    EvaluatorConfig, ParallelEvaluator, UnitOutcome,
};
use evotrade::application::optimization::simulator::Backtester;
use evotrade::domain::evolution::organism::{Organism, new_id};
use evotrade::domain::market::strategy_config::BacktestPeriod;
use evotrade::domain::market::strategy_family::StrategyFamily;
use evotrade::domain::ports::{MarketDataService, ResultsSink};
use evotrade::domain::trading::types::Candle;
use evotrade::infrastructure::observability::Metrics;
use evotrade::infrastructure::{InMemoryResultsSink, SyntheticMarketDataService};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Hangs or panics on the first request, then serves synthetic data
struct FirstCallMisbehaves {
    inner: SyntheticMarketDataService,
    calls: AtomicUsize,
    panic_instead: bool,
}

impl FirstCallMisbehaves {
    fn hang() -> Self {
        Self {
            inner: SyntheticMarketDataService::new(8),
            calls: AtomicUsize::new(0),
            panic_instead: false,
        }
    }

    fn panic() -> Self {
        Self {
            panic_instead: true,
            ..Self::hang()
        }
    }
}

#[async_trait]
impl MarketDataService for FirstCallMisbehaves {
    async fn get_historical_series(&self, symbol: &str, period: BacktestPeriod) -> Result<Vec<Candle>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            if self.panic_instead {
                panic!("feed exploded");
            }
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.inner.get_historical_series(symbol, period).await
    }
}

/// Records the highest number of requests in flight at once
struct ConcurrencyProbe {
    inner: SyntheticMarketDataService,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl MarketDataService for ConcurrencyProbe {
    async fn get_historical_series(&self, symbol: &str, period: BacktestPeriod) -> Result<Vec<Candle>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(25)).await;
        let result = self.inner.get_historical_series(symbol, period).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn organisms(count: usize) -> Vec<Organism> {
    let mut rng = StdRng::seed_from_u64(2024);
    (0..count)
        .map(|_| {
            let id = new_id(&mut rng);
            Organism::create_random(0, id, &mut rng)
        })
        .collect()
}

fn outcome_id(outcome: &UnitOutcome) -> &str {
    match outcome {
        UnitOutcome::Completed(report) => &report.organism_id,
        UnitOutcome::TimedOut { organism_id, .. } => organism_id,
        UnitOutcome::Failed { organism_id, .. } => organism_id,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hung_unit_times_out_without_blocking_siblings() {
    common::init_tracing();
    let config = EvaluatorConfig {
        unit_timeout: Duration::from_secs(2),
        ..EvaluatorConfig::default()
    };
    let sink = InMemoryResultsSink::new();
    let metrics = Metrics::new().unwrap();
    let evaluator = ParallelEvaluator::new(
        Backtester::new(Arc::new(FirstCallMisbehaves::hang())),
        config,
    )
    .with_sink(Arc::new(sink.clone()) as Arc<dyn ResultsSink>)
    .with_metrics(metrics.clone());

    let population = organisms(5);
    let summary = evaluator.test_population(&population, 2).await;

    assert_eq!(summary.timed_out, 1);
    assert_eq!(summary.completed, 4);
    assert_eq!(summary.failed, 0);

    // Results come back in input order
    let ids: Vec<&str> = summary.outcomes.iter().map(outcome_id).collect();
    let expected: Vec<&str> = population.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, expected);

    // Only completed units reach the sink
    assert_eq!(sink.reports().await.len(), 4);
    for report in summary.ranked() {
        assert_eq!(report.families.len(), StrategyFamily::ALL.len());
    }
    assert!(
        metrics
            .render()
            .contains("evotrade_evaluator_units_total{outcome=\"timed_out\"} 1")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_panicking_unit_is_reported_as_failed() {
    let evaluator = ParallelEvaluator::new(
        Backtester::new(Arc::new(FirstCallMisbehaves::panic())),
        EvaluatorConfig::default(),
    );

    let summary = evaluator.test_population(&organisms(4), 3).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.completed, 3);
    let failure = summary
        .outcomes
        .iter()
        .find(|o| matches!(o, UnitOutcome::Failed { .. }))
        .unwrap();
    assert_eq!(failure.label(), "failed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_worker_pool_is_bounded() {
    let probe = Arc::new(ConcurrencyProbe {
        inner: SyntheticMarketDataService::new(4),
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let evaluator = ParallelEvaluator::new(
        Backtester::new(probe.clone()),
        EvaluatorConfig {
            families: vec![StrategyFamily::Scalping, StrategyFamily::Swing],
            ..EvaluatorConfig::default()
        },
    );

    let summary = evaluator.test_population(&organisms(8), 2).await;

    assert_eq!(summary.completed, 8);
    let peak = probe.peak.load(Ordering::SeqCst);
    assert!((1..=2).contains(&peak), "peak in-flight was {}", peak);
}

#[tokio::test]
async fn test_single_worker_still_finishes_batch() {
    let evaluator = ParallelEvaluator::new(
        Backtester::new(Arc::new(SyntheticMarketDataService::new(6))),
        EvaluatorConfig::default(),
    );

    // Zero is clamped to one worker
    let summary = evaluator.test_population(&organisms(3), 0).await;
    assert_eq!(summary.completed, 3);
    assert!(summary.best().is_some());
}
