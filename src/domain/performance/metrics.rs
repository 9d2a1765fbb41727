use super::stats::Stats;
use crate::domain::trading::types::ClosedTrade;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Closed trades kept in a record's trade log (most recent wins)
pub const TRADE_LOG_CAPACITY: usize = 100;

/// Outcome of one backtest run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub initial_capital: Decimal,
    pub final_equity: Decimal,

    pub total_return_pct: f64,
    /// Worst peak-to-trough fall in percent (≤ 0)
    pub max_drawdown_pct: f64,

    // Risk-adjusted, annualized
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,

    pub win_rate_pct: f64,
    pub total_trades: usize,
    pub trade_log: Vec<ClosedTrade>,
}

impl PerformanceRecord {
    /// Derive every metric from a per-bar equity curve and the closed trades.
    /// `total_trades` counts all closed trades even when the log is truncated.
    pub fn from_equity_curve(
        initial_capital: Decimal,
        equity_curve: &[Decimal],
        trades: Vec<ClosedTrade>,
    ) -> Self {
        let final_equity = equity_curve.last().copied().unwrap_or(initial_capital);

        let total_return_pct = if initial_capital > Decimal::ZERO {
            ((final_equity - initial_capital) / initial_capital * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let curve: Vec<f64> = equity_curve
            .iter()
            .map(|e| e.to_f64().unwrap_or(0.0))
            .collect();
        let returns = Stats::daily_returns(&curve);

        let total_trades = trades.len();
        let wins = trades.iter().filter(|t| t.is_win()).count();
        let win_rate_pct = if total_trades > 0 {
            wins as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let mut trade_log = trades;
        if trade_log.len() > TRADE_LOG_CAPACITY {
            trade_log.drain(..trade_log.len() - TRADE_LOG_CAPACITY);
        }

        Self {
            initial_capital,
            final_equity,
            total_return_pct,
            max_drawdown_pct: Stats::max_drawdown(&curve) * 100.0,
            sharpe_ratio: Stats::sharpe_ratio(&returns),
            sortino_ratio: Stats::sortino_ratio(&returns),
            win_rate_pct,
            total_trades,
            trade_log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade(pnl_sign: i64, ts: i64) -> ClosedTrade {
        let exit = if pnl_sign > 0 { dec!(110) } else { dec!(90) };
        ClosedTrade::new(ts, dec!(100), ts + 1, exit, dec!(1))
    }

    #[test]
    fn test_empty_curve_is_flat() {
        let record = PerformanceRecord::from_equity_curve(dec!(1000), &[], vec![]);
        assert_eq!(record.final_equity, dec!(1000));
        assert_eq!(record.total_return_pct, 0.0);
        assert_eq!(record.max_drawdown_pct, 0.0);
        assert_eq!(record.win_rate_pct, 0.0);
        assert_eq!(record.total_trades, 0);
    }

    #[test]
    fn test_returns_and_drawdown_in_percent() {
        let curve = [dec!(1000), dec!(1200), dec!(900), dec!(1100)];
        let record = PerformanceRecord::from_equity_curve(dec!(1000), &curve, vec![]);
        assert!((record.total_return_pct - 10.0).abs() < 1e-9);
        assert!((record.max_drawdown_pct - (-25.0)).abs() < 1e-9);
    }

    #[test]
    fn test_win_rate_and_log_truncation() {
        let trades: Vec<ClosedTrade> = (0..150)
            .map(|i| trade(if i % 3 == 0 { 1 } else { -1 }, i))
            .collect();
        let record = PerformanceRecord::from_equity_curve(dec!(1000), &[dec!(1000)], trades);

        assert_eq!(record.total_trades, 150);
        assert_eq!(record.trade_log.len(), TRADE_LOG_CAPACITY);
        // Most recent trades are kept
        assert_eq!(record.trade_log.last().map(|t| t.entry_timestamp), Some(149));
        assert!((record.win_rate_pct - 100.0 / 3.0).abs() < 1e-9);
    }
}
