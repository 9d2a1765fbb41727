//! Port interfaces the optimizer core depends on.
//!
//! The core never reaches for a global store: market data comes in through
//! [`MarketDataService`] and results go out through [`ResultsSink`].

use crate::domain::evolution::report::{GenerationStats, OrganismTestReport};
use crate::domain::market::strategy_config::BacktestPeriod;
use crate::domain::trading::types::Candle;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MarketDataService: Send + Sync {
    /// Daily bars for `symbol` over `period`, oldest first.
    /// An empty vector means no data for the window.
    async fn get_historical_series(&self, symbol: &str, period: BacktestPeriod) -> Result<Vec<Candle>>;
}

/// Consumer of generation statistics and evaluator results
#[async_trait]
pub trait ResultsSink: Send + Sync {
    async fn record_generation(&self, stats: &GenerationStats) -> Result<()>;
    async fn record_test_report(&self, report: &OrganismTestReport) -> Result<()>;
}
