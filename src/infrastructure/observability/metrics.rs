//! Prometheus metrics definitions for evotrade
//!
//! All metrics use the `evotrade_` prefix and are read-only.

use prometheus::{
    Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Prometheus metrics for the optimizer and safety gate
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Generations completed
    pub generations_total: Counter,
    /// Best fitness of the latest generation
    pub best_fitness: Gauge,
    /// Average fitness of the latest generation
    pub avg_fitness: Gauge,
    /// Wall time of one generational step
    pub generation_duration_seconds: Histogram,
    /// Evaluation failures by kind (backtest, timeout, worker)
    pub evaluation_failures_total: CounterVec,
    /// Parallel evaluator units by outcome
    pub evaluator_units_total: CounterVec,
    /// Safety gate denials by reason
    pub safety_denials_total: CounterVec,
    /// Recorded trade results by outcome (win, loss, flat)
    pub trade_results_total: CounterVec,
    /// Circuit breaker status (0=armed, 1=tripped)
    pub circuit_breaker_status: Gauge,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let generations_total = Counter::with_opts(Opts::new(
            "evotrade_generations_total",
            "Total generations evolved",
        ))?;
        registry.register(Box::new(generations_total.clone()))?;

        let best_fitness = Gauge::with_opts(Opts::new(
            "evotrade_best_fitness",
            "Best fitness of the latest generation (0-1)",
        ))?;
        registry.register(Box::new(best_fitness.clone()))?;

        let avg_fitness = Gauge::with_opts(Opts::new(
            "evotrade_avg_fitness",
            "Average fitness of the latest generation (0-1)",
        ))?;
        registry.register(Box::new(avg_fitness.clone()))?;

        let generation_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "evotrade_generation_duration_seconds",
                "Wall time of one generational step in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;
        registry.register(Box::new(generation_duration_seconds.clone()))?;

        let evaluation_failures_total = CounterVec::new(
            Opts::new(
                "evotrade_evaluation_failures_total",
                "Total failed candidate evaluations by kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(evaluation_failures_total.clone()))?;

        let evaluator_units_total = CounterVec::new(
            Opts::new(
                "evotrade_evaluator_units_total",
                "Total parallel evaluator units by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(evaluator_units_total.clone()))?;

        let safety_denials_total = CounterVec::new(
            Opts::new(
                "evotrade_safety_denials_total",
                "Total trades denied by the safety gate by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(safety_denials_total.clone()))?;

        let trade_results_total = CounterVec::new(
            Opts::new(
                "evotrade_trade_results_total",
                "Total trade results recorded by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(trade_results_total.clone()))?;

        let circuit_breaker_status = Gauge::with_opts(Opts::new(
            "evotrade_circuit_breaker_status",
            "Circuit breaker status (0=armed, 1=tripped)",
        ))?;
        registry.register(Box::new(circuit_breaker_status.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            generations_total,
            best_fitness,
            avg_fitness,
            generation_duration_seconds,
            evaluation_failures_total,
            evaluator_units_total,
            safety_denials_total,
            trade_results_total,
            circuit_breaker_status,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_evaluation_failures(&self, kind: &str, count: u64) {
        self.evaluation_failures_total
            .with_label_values(&[kind])
            .inc_by(count as f64);
    }

    pub fn inc_evaluator_unit(&self, outcome: &str) {
        self.evaluator_units_total.with_label_values(&[outcome]).inc();
    }

    pub fn inc_safety_denial(&self, reason: &str) {
        self.safety_denials_total.with_label_values(&[reason]).inc();
    }

    pub fn inc_trade_result(&self, outcome: &str) {
        self.trade_results_total.with_label_values(&[outcome]).inc();
    }

    pub fn set_circuit_breaker(&self, tripped: bool) {
        self.circuit_breaker_status
            .set(if tripped { 1.0 } else { 0.0 });
    }
}
