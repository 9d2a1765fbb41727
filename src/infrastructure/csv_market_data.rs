use crate::domain::market::strategy_config::BacktestPeriod;
use crate::domain::ports::MarketDataService;
use crate::domain::trading::types::Candle;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvBar {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    // Blank closes are kept as zero so the backtester reports them as missing
    close: Option<f64>,
    #[serde(default)]
    volume: f64,
}

/// Reads daily bars from `<dir>/<SYMBOL>.csv`.
///
/// Expected header: `timestamp,open,high,low,close,volume` with unix-second
/// timestamps. Rows are sorted by timestamp and the period keeps the most
/// recent bars.
#[derive(Debug, Clone)]
pub struct CsvMarketDataService {
    data_dir: PathBuf,
}

impl CsvMarketDataService {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", symbol.to_uppercase()))
    }

    fn parse(symbol: &str, content: &str) -> Result<Vec<Candle>> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut candles = Vec::new();
        for (line, row) in rdr.deserialize::<CsvBar>().enumerate() {
            let bar = row.with_context(|| format!("Invalid row {} for {}", line + 1, symbol))?;
            candles.push(Candle {
                symbol: symbol.to_string(),
                open: to_decimal(bar.open),
                high: to_decimal(bar.high),
                low: to_decimal(bar.low),
                close: bar.close.map(to_decimal).unwrap_or(Decimal::ZERO),
                volume: to_decimal(bar.volume),
                timestamp: bar.timestamp,
            });
        }
        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }
}

#[async_trait]
impl MarketDataService for CsvMarketDataService {
    async fn get_historical_series(&self, symbol: &str, period: BacktestPeriod) -> Result<Vec<Candle>> {
        let path = self.path_for(symbol);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read market data file {:?}", path))?;

        let mut candles = Self::parse(symbol, &content)?;
        let skip = candles.len().saturating_sub(period.trading_days());
        candles.drain(..skip);

        debug!(
            "CsvMarketDataService: {} bars for {} ({}) from {:?}",
            candles.len(),
            symbol,
            period,
            path
        );
        Ok(candles)
    }
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO).round_dp(6)
}
