mod common;

use evotrade::application::optimization::engine::EvolutionEngine;
use evotrade::application::optimization::population::{
    EvaluationTarget, Population, PopulationConfig,
};
use evotrade::application::optimization::simulator::Backtester;
use evotrade::domain::market::strategy_config::BacktestPeriod;
use evotrade::infrastructure::observability::Metrics;
use evotrade::infrastructure::{InMemoryResultsSink, SyntheticMarketDataService};
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;

fn population(size: usize, seed: u64) -> Population {
    let config = PopulationConfig {
        size,
        seed: Some(seed),
        ..PopulationConfig::default()
    };
    let target = EvaluationTarget {
        symbol: "SPY".to_string(),
        period: BacktestPeriod::SixMonths,
        initial_capital: dec!(100000),
    };
    let backtester = Backtester::new(Arc::new(SyntheticMarketDataService::new(seed)));
    Population::new(config, target, backtester).expect("valid population config")
}

#[tokio::test]
async fn test_population_size_is_stable_over_many_generations() {
    common::init_tracing();

    for size in [4, 7, 20] {
        let mut population = population(size, 99);
        for generation in 0..20u32 {
            let stats = population.evolve().await;
            assert_eq!(stats.generation, generation);
            assert_eq!(stats.population_size, size);
            assert_eq!(population.len(), size, "size drifted at gen {}", generation);
        }
        assert_eq!(population.generation(), 20);
    }
}

#[tokio::test]
async fn test_moving_average_order_survives_breeding() {
    let mut population = population(12, 3);
    for _ in 0..25 {
        population.evolve().await;
        for organism in population.organisms() {
            assert!(
                organism.dna.ma_fast() < organism.dna.ma_slow(),
                "{} has fast {} >= slow {}",
                organism.id,
                organism.dna.ma_fast(),
                organism.dna.ma_slow()
            );
        }
    }
}

#[tokio::test]
async fn test_offspring_ids_are_unique_and_lineage_is_recorded() {
    let mut population = population(10, 17);
    let mut seen: HashSet<String> = population.organisms().iter().map(|o| o.id.clone()).collect();

    for _ in 0..5 {
        let previous: HashSet<String> =
            population.organisms().iter().map(|o| o.id.clone()).collect();
        population.evolve().await;

        for organism in population.organisms() {
            if previous.contains(&organism.id) {
                // Elites carry over unchanged
                continue;
            }
            assert!(seen.insert(organism.id.clone()), "duplicate id {}", organism.id);
            let [a, b] = organism.parents.as_ref().expect("offspring record parents");
            assert!(previous.contains(a) && previous.contains(b));
            assert_ne!(a, b);
        }
    }
}

#[tokio::test]
async fn test_engine_records_history_and_metrics() {
    let sink = InMemoryResultsSink::new();
    let metrics = Metrics::new().unwrap();
    let mut engine = EvolutionEngine::new(population(8, 5), Arc::new(sink.clone()))
        .with_metrics(metrics.clone());

    let summary = engine.run(Some(5)).await;

    assert_eq!(summary.generations_run, 5);
    assert!(!summary.stopped_by_shutdown);

    let history = sink.generations().await;
    let generations: Vec<u32> = history.iter().map(|s| s.generation).collect();
    assert_eq!(generations, vec![0, 1, 2, 3, 4]);

    let best = summary.best_ever.expect("a best organism after five generations");
    for stats in &history {
        assert!(best.fitness >= stats.best_fitness);
        assert!(stats.best_fitness >= stats.avg_fitness);
        assert!(stats.avg_fitness >= stats.worst_fitness);
    }

    assert!(metrics.render().contains("evotrade_generations_total 5"));
}

#[tokio::test]
async fn test_missing_market_data_degrades_to_zero_fitness() {
    let config = PopulationConfig {
        size: 6,
        seed: Some(1),
        ..PopulationConfig::default()
    };
    let backtester = Backtester::new(Arc::new(SyntheticMarketDataService::empty()));
    let mut population =
        Population::new(config, EvaluationTarget::default(), backtester).unwrap();

    for _ in 0..3 {
        let stats = population.evolve().await;
        assert_eq!(stats.best_fitness, 0.0);
        assert_eq!(stats.failed_evaluations, 6);
        assert_eq!(population.len(), 6);
    }
}
