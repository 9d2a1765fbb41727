use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub symbol: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub timestamp: i64,
}

/// Represents a completed round trip in a backtest with realized profit/loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub entry_timestamp: i64,
    pub exit_timestamp: i64,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub pnl: Decimal, // exit_value - entry_value
}

impl ClosedTrade {
    pub fn new(
        entry_timestamp: i64,
        entry_price: Decimal,
        exit_timestamp: i64,
        exit_price: Decimal,
        quantity: Decimal,
    ) -> Self {
        let entry_value = entry_price * quantity;
        let exit_value = exit_price * quantity;
        Self {
            entry_timestamp,
            exit_timestamp,
            entry_price,
            exit_price,
            quantity,
            pnl: exit_value - entry_value,
        }
    }

    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }
}

/// A trade proposed by the execution path, checked by the safety gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeProposal {
    pub symbol: String,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub quantity: Decimal,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_closed_trade_pnl() {
        let win = ClosedTrade::new(0, dec!(100), 86_400, dec!(110), dec!(10));
        assert_eq!(win.pnl, dec!(100));
        assert!(win.is_win());

        let loss = ClosedTrade::new(0, dec!(100), 86_400, dec!(95), dec!(10));
        assert_eq!(loss.pnl, dec!(-50));
        assert!(!loss.is_win());
    }
}
