use crate::domain::market::strategy_config::BacktestPeriod;
use crate::domain::ports::MarketDataService;
use crate::domain::trading::types::Candle;
use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const SECONDS_PER_DAY: i64 = 86_400;
// 2020-01-02, first bar of every generated series
const SERIES_START_TS: i64 = 1_577_923_200;

/// Random-walk shape for generated series
#[derive(Debug, Clone, Copy)]
pub struct RandomWalkConfig {
    pub seed: u64,
    pub start_price: f64,
    pub daily_drift: f64,
    pub daily_volatility: f64,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start_price: 100.0,
            daily_drift: 0.0004,
            daily_volatility: 0.02,
        }
    }
}

/// Deterministic market-data provider for tests and offline runs.
///
/// Explicit series win over generated ones. Without a random-walk config,
/// unknown symbols return an empty series.
#[derive(Clone, Default)]
pub struct SyntheticMarketDataService {
    series: HashMap<String, Vec<Candle>>,
    random_walk: Option<RandomWalkConfig>,
    latency: HashMap<String, Duration>,
}

impl SyntheticMarketDataService {
    /// Seeded random walk for every symbol
    pub fn new(seed: u64) -> Self {
        Self::with_random_walk(RandomWalkConfig {
            seed,
            ..RandomWalkConfig::default()
        })
    }

    pub fn with_random_walk(config: RandomWalkConfig) -> Self {
        Self {
            random_walk: Some(config),
            ..Self::default()
        }
    }

    /// Only explicitly registered series
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.series.insert(symbol.to_uppercase(), candles);
        self
    }

    /// Delay every fetch for `symbol`, e.g. to exercise timeouts
    pub fn with_latency(mut self, symbol: &str, latency: Duration) -> Self {
        self.latency.insert(symbol.to_uppercase(), latency);
        self
    }

    fn generate(&self, config: &RandomWalkConfig, symbol: &str, len: usize) -> Vec<Candle> {
        let symbol_seed = symbol
            .bytes()
            .fold(config.seed, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut rng = StdRng::seed_from_u64(symbol_seed);

        let vol = config.daily_volatility.abs().max(f64::EPSILON);
        let mut closes = Vec::with_capacity(len);
        let mut price = config.start_price;
        for _ in 0..len {
            let shock = rng.random_range(-vol..vol);
            price = (price * (1.0 + config.daily_drift + shock)).max(0.01);
            closes.push(price);
        }
        candles_from_closes(symbol, &closes)
    }
}

#[async_trait]
impl MarketDataService for SyntheticMarketDataService {
    async fn get_historical_series(&self, symbol: &str, period: BacktestPeriod) -> Result<Vec<Candle>> {
        let key = symbol.to_uppercase();
        if let Some(delay) = self.latency.get(&key) {
            tokio::time::sleep(*delay).await;
        }

        let days = period.trading_days();
        let candles = match (self.series.get(&key), &self.random_walk) {
            (Some(series), _) => {
                let skip = series.len().saturating_sub(days);
                series[skip..].to_vec()
            }
            (None, Some(config)) => {
                // Always walk the longest window so shorter periods are its tail
                let full = self.generate(config, &key, BacktestPeriod::FiveYears.trading_days());
                full[full.len() - days..].to_vec()
            }
            (None, None) => Vec::new(),
        };

        debug!(
            "SyntheticMarketDataService: {} bars for {} ({})",
            candles.len(),
            symbol,
            period
        );
        Ok(candles)
    }
}

/// Daily candles with the given closes, open at the previous close
pub fn candles_from_closes(symbol: &str, closes: &[f64]) -> Vec<Candle> {
    let mut prev: Option<Decimal> = None;
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let close = Decimal::from_f64(c).unwrap_or(Decimal::ZERO).round_dp(4);
            let open = prev.unwrap_or(close);
            prev = Some(close);
            Candle {
                symbol: symbol.to_string(),
                open,
                high: open.max(close),
                low: open.min(close),
                close,
                volume: Decimal::from(1_000_000),
                timestamp: SERIES_START_TS + i as i64 * SECONDS_PER_DAY,
            }
        })
        .collect()
}
