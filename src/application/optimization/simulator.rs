use crate::domain::errors::BacktestError;
use crate::domain::market::signals::{Signal, generate_signals};
use crate::domain::market::strategy_config::{BacktestPeriod, StrategyKind};
use crate::domain::performance::metrics::PerformanceRecord;
use crate::domain::ports::MarketDataService;
use crate::domain::trading::types::{Candle, ClosedTrade};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use tracing::{debug, info};

/// Deterministic single-position, long-only backtester.
///
/// `simulate` is the pure core; `run_backtest` resolves the series through the
/// market-data port first.
#[derive(Clone)]
pub struct Backtester {
    market_data: Arc<dyn MarketDataService>,
}

impl Backtester {
    pub fn new(market_data: Arc<dyn MarketDataService>) -> Self {
        Self { market_data }
    }

    /// Fetch and sanity-check a series. Empty series and non-positive closes are
    /// reported as `DataUnavailable`.
    pub async fn fetch_series(
        &self,
        symbol: &str,
        period: BacktestPeriod,
    ) -> Result<Vec<Candle>, BacktestError> {
        let unavailable = |reason: String| BacktestError::DataUnavailable {
            symbol: symbol.to_string(),
            period: period.to_string(),
            reason,
        };

        let bars = self
            .market_data
            .get_historical_series(symbol, period)
            .await
            .map_err(|e| unavailable(format!("{:#}", e)))?;

        if bars.is_empty() {
            return Err(unavailable("empty series".to_string()));
        }
        if let Some(bad) = bars.iter().find(|b| b.close <= Decimal::ZERO) {
            return Err(unavailable(format!(
                "missing close price at timestamp {}",
                bad.timestamp
            )));
        }

        debug!(
            "Backtester: fetched {} bars for {} ({})",
            bars.len(),
            symbol,
            period
        );
        Ok(bars)
    }

    pub async fn run_backtest(
        &self,
        symbol: &str,
        kind: &StrategyKind,
        period: BacktestPeriod,
        initial_capital: Decimal,
    ) -> Result<PerformanceRecord, BacktestError> {
        // Invalid parameters fail before any data is requested
        kind.validate()?;
        let bars = self.fetch_series(symbol, period).await?;
        let record = Self::simulate(&bars, kind, initial_capital)?;

        info!(
            "Backtest {} {} ({}): return {:.2}%, sharpe {:.2}, trades {}",
            kind.name(),
            symbol,
            period,
            record.total_return_pct,
            record.sharpe_ratio,
            record.total_trades
        );
        Ok(record)
    }

    /// Replay `bars` under `kind`. Same inputs always give the same record.
    pub fn simulate(
        bars: &[Candle],
        kind: &StrategyKind,
        initial_capital: Decimal,
    ) -> Result<PerformanceRecord, BacktestError> {
        kind.validate()?;
        if initial_capital <= Decimal::ZERO {
            return Err(BacktestError::InvalidParameters(format!(
                "initial capital must be positive, got {}",
                initial_capital
            )));
        }

        let closes: Vec<f64> = bars
            .iter()
            .map(|b| b.close.to_f64().unwrap_or(0.0))
            .collect();
        let signals = generate_signals(&closes, kind)?;

        let mut cash = initial_capital;
        let mut shares = Decimal::ZERO;
        let mut entry: Option<(i64, Decimal)> = None;
        let mut trades = Vec::new();
        let mut equity_curve = Vec::with_capacity(bars.len());

        for (bar, signal) in bars.iter().zip(signals) {
            let price = bar.close;
            match signal {
                Signal::Buy if shares.is_zero() && price > Decimal::ZERO => {
                    let qty = (cash / price).floor();
                    if qty > Decimal::ZERO {
                        cash -= qty * price;
                        shares = qty;
                        entry = Some((bar.timestamp, price));
                    }
                }
                Signal::Sell if shares > Decimal::ZERO => {
                    cash += shares * price;
                    if let Some((entry_ts, entry_price)) = entry.take() {
                        trades.push(ClosedTrade::new(
                            entry_ts,
                            entry_price,
                            bar.timestamp,
                            price,
                            shares,
                        ));
                    }
                    shares = Decimal::ZERO;
                }
                _ => {}
            }
            equity_curve.push(cash + shares * price);
        }

        Ok(PerformanceRecord::from_equity_curve(
            initial_capital,
            &equity_curve,
            trades,
        ))
    }
}
