//! In-memory results sink
//!
//! Thread-safe storage for generation statistics and evaluator reports using
//! `Arc<RwLock>`. Data is lost when the process exits.

use crate::domain::evolution::report::{GenerationStats, OrganismTestReport};
use crate::domain::ports::ResultsSink;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryResultsSink {
    generations: Arc<RwLock<Vec<GenerationStats>>>,
    reports: Arc<RwLock<Vec<OrganismTestReport>>>,
}

impl InMemoryResultsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn generations(&self) -> Vec<GenerationStats> {
        self.generations.read().await.clone()
    }

    pub async fn reports(&self) -> Vec<OrganismTestReport> {
        self.reports.read().await.clone()
    }

    /// Stats of the generation with the highest best fitness
    pub async fn best_generation(&self) -> Option<GenerationStats> {
        self.generations
            .read()
            .await
            .iter()
            .max_by(|a, b| a.best_fitness.total_cmp(&b.best_fitness))
            .cloned()
    }
}

#[async_trait]
impl ResultsSink for InMemoryResultsSink {
    async fn record_generation(&self, stats: &GenerationStats) -> Result<()> {
        self.generations.write().await.push(stats.clone());
        Ok(())
    }

    async fn record_test_report(&self, report: &OrganismTestReport) -> Result<()> {
        self.reports.write().await.push(report.clone());
        Ok(())
    }
}
