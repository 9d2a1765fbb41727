use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-session state of the safety gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyState {
    /// Capital at the start of the session
    pub initial_capital: Decimal,

    /// Latest reported capital
    pub current_capital: Decimal,

    /// current_capital - initial_capital
    pub daily_pnl: Decimal,

    /// Number of losing trades in a row
    pub consecutive_losses: u32,

    pub trades_today: u32,

    /// Once set, only a session reset clears it
    pub circuit_breaker_active: bool,

    pub trip_reason: Option<String>,
}

impl SafetyState {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            current_capital: initial_capital,
            daily_pnl: Decimal::ZERO,
            consecutive_losses: 0,
            trades_today: 0,
            circuit_breaker_active: false,
            trip_reason: None,
        }
    }

    /// Daily P&L as a fraction of initial capital (0 when capital is not positive)
    pub fn daily_pnl_ratio(&self) -> Decimal {
        if self.initial_capital > Decimal::ZERO {
            self.daily_pnl / self.initial_capital
        } else {
            Decimal::ZERO
        }
    }
}
