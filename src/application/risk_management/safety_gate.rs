use crate::domain::errors::SafetyViolation;
use crate::domain::risk::risk_config::SafetyConfig;
use crate::domain::risk::state::SafetyState;
use crate::domain::risk::validation::ValidationResult;
use crate::domain::trading::types::TradeProposal;
use crate::infrastructure::observability::Metrics;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// ARMED allows trading; TRIPPED blocks everything until a session reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateStatus {
    Armed,
    Tripped,
}

/// Per-session risk limiter consulted before any trade is submitted
pub struct SafetyGate {
    config: SafetyConfig,
    state: SafetyState,
    metrics: Option<Metrics>,
}

impl SafetyGate {
    pub fn new(config: SafetyConfig, initial_capital: Decimal) -> Self {
        info!(
            "SafetyGate: armed with capital {} (daily loss {}%, streak {}, trades/day {})",
            initial_capital,
            config.max_daily_loss_pct * dec!(100),
            config.max_consecutive_losses,
            config.max_trades_per_day
        );
        Self {
            config,
            state: SafetyState::new(initial_capital),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        metrics.set_circuit_breaker(self.state.circuit_breaker_active);
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    pub fn state(&self) -> &SafetyState {
        &self.state
    }

    pub fn status(&self) -> GateStatus {
        if self.state.circuit_breaker_active {
            GateStatus::Tripped
        } else {
            GateStatus::Armed
        }
    }

    /// Check a trade against every limit; the first failing check wins.
    /// Breaching the daily-loss or losing-streak limit trips the breaker.
    pub fn validate_trade(
        &mut self,
        entry_price: Decimal,
        stop_loss: Decimal,
        quantity: Decimal,
    ) -> ValidationResult {
        match self.check(entry_price, stop_loss, quantity) {
            Ok(()) => {
                debug!(
                    "SafetyGate: approved entry {} stop {} qty {}",
                    entry_price, stop_loss, quantity
                );
                ValidationResult::Approve
            }
            Err(violation) => {
                if violation.trips_breaker() {
                    self.trip(violation.to_string());
                }
                warn!("SafetyGate: denied trade: {}", violation);
                if let Some(metrics) = &self.metrics {
                    metrics.inc_safety_denial(violation.kind());
                }
                ValidationResult::Reject(violation)
            }
        }
    }

    pub fn validate_proposal(&mut self, proposal: &TradeProposal) -> ValidationResult {
        debug!(
            "SafetyGate: validating {} proposal ({})",
            proposal.symbol, proposal.reason
        );
        self.validate_trade(proposal.entry_price, proposal.stop_loss, proposal.quantity)
    }

    fn check(
        &self,
        entry_price: Decimal,
        stop_loss: Decimal,
        quantity: Decimal,
    ) -> Result<(), SafetyViolation> {
        let state = &self.state;

        if state.circuit_breaker_active {
            return Err(SafetyViolation::CircuitBreakerActive {
                reason: state
                    .trip_reason
                    .clone()
                    .unwrap_or_else(|| "tripped".to_string()),
            });
        }

        let pnl_ratio = state.daily_pnl_ratio();
        if pnl_ratio <= -self.config.max_daily_loss_pct {
            return Err(SafetyViolation::DailyLossLimit {
                loss_pct: pnl_ratio * dec!(100),
                limit_pct: self.config.max_daily_loss_pct * dec!(100),
            });
        }

        if state.consecutive_losses >= self.config.max_consecutive_losses {
            return Err(SafetyViolation::ConsecutiveLossLimit {
                count: state.consecutive_losses,
                limit: self.config.max_consecutive_losses,
            });
        }

        if state.trades_today >= self.config.max_trades_per_day {
            return Err(SafetyViolation::DailyTradeLimit {
                count: state.trades_today,
                limit: self.config.max_trades_per_day,
            });
        }

        if entry_price <= Decimal::ZERO || quantity <= Decimal::ZERO {
            return Err(SafetyViolation::InvalidTrade {
                reason: format!(
                    "entry price ({}) and quantity ({}) must be positive",
                    entry_price, quantity
                ),
            });
        }

        let capital = state.current_capital;
        let position_value = entry_price * quantity;
        if position_value > capital * self.config.max_position_size_pct {
            return Err(SafetyViolation::PositionSizeLimit {
                position_value,
                position_pct: pct_of(position_value, capital),
                max_pct: self.config.max_position_size_pct * dec!(100),
            });
        }

        let risk_amount = (entry_price - stop_loss).abs() * quantity;
        if risk_amount > capital * self.config.max_risk_per_trade_pct {
            return Err(SafetyViolation::RiskPerTradeLimit {
                risk_amount,
                risk_pct: pct_of(risk_amount, capital),
                max_pct: self.config.max_risk_per_trade_pct * dec!(100),
            });
        }

        Ok(())
    }

    /// Book a closed trade's P&L. Wins reset the losing streak, losses extend it,
    /// flat trades leave it alone. Capital is reported separately via `update_capital`.
    pub fn record_trade_result(&mut self, pnl: Decimal) {
        self.state.trades_today += 1;

        let outcome = if pnl > Decimal::ZERO {
            self.state.consecutive_losses = 0;
            "win"
        } else if pnl < Decimal::ZERO {
            self.state.consecutive_losses += 1;
            "loss"
        } else {
            "flat"
        };
        if let Some(metrics) = &self.metrics {
            metrics.inc_trade_result(outcome);
        }

        info!(
            "SafetyGate: recorded {} trade (pnl {}), streak {}, trades today {}",
            outcome, pnl, self.state.consecutive_losses, self.state.trades_today
        );

        if self.state.consecutive_losses >= self.config.max_consecutive_losses {
            let violation = SafetyViolation::ConsecutiveLossLimit {
                count: self.state.consecutive_losses,
                limit: self.config.max_consecutive_losses,
            };
            self.trip(violation.to_string());
        }
    }

    /// Report new capital. Recomputes daily P&L; the next validation acts on it.
    pub fn update_capital(&mut self, new_capital: Decimal) {
        self.state.current_capital = new_capital;
        self.state.daily_pnl = new_capital - self.state.initial_capital;
        debug!(
            "SafetyGate: capital {} (daily pnl {})",
            new_capital, self.state.daily_pnl
        );
    }

    /// Hard block until `reset_session`. The first trip reason is kept.
    pub fn trip(&mut self, reason: impl Into<String>) {
        if self.state.circuit_breaker_active {
            return;
        }
        let reason = reason.into();
        error!("SafetyGate: CIRCUIT BREAKER TRIPPED: {}", reason);
        self.state.circuit_breaker_active = true;
        self.state.trip_reason = Some(reason);
        if let Some(metrics) = &self.metrics {
            metrics.set_circuit_breaker(true);
        }
    }

    /// Start a new session. The only way back to ARMED.
    pub fn reset_session(&mut self, initial_capital: Decimal) {
        info!(
            "SafetyGate: session reset with capital {} (was {:?})",
            initial_capital,
            self.status()
        );
        self.state = SafetyState::new(initial_capital);
        if let Some(metrics) = &self.metrics {
            metrics.set_circuit_breaker(false);
        }
    }
}

fn pct_of(value: Decimal, capital: Decimal) -> Decimal {
    if capital > Decimal::ZERO {
        value / capital * dec!(100)
    } else {
        Decimal::ZERO
    }
}

/// Gate shared by concurrent submission paths; every call serializes on one mutex
#[derive(Clone)]
pub struct SharedSafetyGate {
    inner: Arc<Mutex<SafetyGate>>,
}

impl SharedSafetyGate {
    pub fn new(gate: SafetyGate) -> Self {
        Self {
            inner: Arc::new(Mutex::new(gate)),
        }
    }

    pub async fn validate_trade(
        &self,
        entry_price: Decimal,
        stop_loss: Decimal,
        quantity: Decimal,
    ) -> ValidationResult {
        self.inner
            .lock()
            .await
            .validate_trade(entry_price, stop_loss, quantity)
    }

    pub async fn validate_proposal(&self, proposal: &TradeProposal) -> ValidationResult {
        self.inner.lock().await.validate_proposal(proposal)
    }

    pub async fn record_trade_result(&self, pnl: Decimal) {
        self.inner.lock().await.record_trade_result(pnl);
    }

    pub async fn update_capital(&self, new_capital: Decimal) {
        self.inner.lock().await.update_capital(new_capital);
    }

    pub async fn trip(&self, reason: impl Into<String>) {
        self.inner.lock().await.trip(reason);
    }

    pub async fn reset_session(&self, initial_capital: Decimal) {
        self.inner.lock().await.reset_session(initial_capital);
    }

    pub async fn status(&self) -> GateStatus {
        self.inner.lock().await.status()
    }

    pub async fn snapshot(&self) -> SafetyState {
        self.inner.lock().await.state().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> SafetyGate {
        SafetyGate::new(SafetyConfig::default(), dec!(100000))
    }

    #[test]
    fn test_allows_trade_within_limits() {
        let mut gate = gate();
        assert!(gate.validate_trade(dec!(100), dec!(99), dec!(100)).is_approved());
    }

    #[test]
    fn test_denies_excess_risk_per_trade() {
        let mut gate = gate();
        let result = gate.validate_trade(dec!(100), dec!(94), dec!(100));
        assert!(result.rejection_reason().unwrap().contains("Risk per trade"));
        assert_eq!(gate.status(), GateStatus::Armed);
    }

    #[test]
    fn test_denies_oversized_position() {
        let mut gate = gate();
        // 250 * 100 = 25% of capital
        let result = gate.validate_trade(dec!(100), dec!(99.9), dec!(250));
        assert!(matches!(
            result.violation(),
            Some(SafetyViolation::PositionSizeLimit { .. })
        ));
    }

    #[test]
    fn test_daily_loss_trips_and_survives_recovery() {
        let mut gate = gate();
        gate.update_capital(dec!(98000));
        let result = gate.validate_trade(dec!(100), dec!(99), dec!(10));
        assert!(matches!(
            result.violation(),
            Some(SafetyViolation::DailyLossLimit { .. })
        ));
        assert_eq!(gate.status(), GateStatus::Tripped);

        gate.update_capital(dec!(105000));
        let result = gate.validate_trade(dec!(100), dec!(99), dec!(10));
        assert!(matches!(
            result.violation(),
            Some(SafetyViolation::CircuitBreakerActive { .. })
        ));
    }

    #[test]
    fn test_loss_just_above_limit_is_allowed() {
        let mut gate = gate();
        gate.update_capital(dec!(98001));
        assert!(gate.validate_trade(dec!(100), dec!(99), dec!(10)).is_approved());
    }

    #[test]
    fn test_losing_streak_trips_on_record() {
        let mut gate = gate();
        for _ in 0..4 {
            gate.record_trade_result(dec!(-10));
        }
        assert_eq!(gate.status(), GateStatus::Armed);
        gate.record_trade_result(dec!(-10));
        assert_eq!(gate.status(), GateStatus::Tripped);
        assert!(gate.validate_trade(dec!(100), dec!(99), dec!(10)).is_rejected());
    }

    #[test]
    fn test_win_resets_streak_and_flat_is_neutral() {
        let mut gate = gate();
        gate.record_trade_result(dec!(-10));
        gate.record_trade_result(dec!(-10));
        gate.record_trade_result(Decimal::ZERO);
        assert_eq!(gate.state().consecutive_losses, 2);
        gate.record_trade_result(dec!(5));
        assert_eq!(gate.state().consecutive_losses, 0);
        assert_eq!(gate.state().trades_today, 4);
    }

    #[test]
    fn test_trade_limit_is_soft() {
        let mut gate = SafetyGate::new(
            SafetyConfig {
                max_trades_per_day: 2,
                ..SafetyConfig::default()
            },
            dec!(100000),
        );
        gate.record_trade_result(dec!(1));
        gate.record_trade_result(dec!(1));
        let result = gate.validate_trade(dec!(100), dec!(99), dec!(10));
        assert!(matches!(
            result.violation(),
            Some(SafetyViolation::DailyTradeLimit { .. })
        ));
        assert_eq!(gate.status(), GateStatus::Armed);
    }

    #[test]
    fn test_reset_session_rearms() {
        let mut gate = gate();
        gate.trip("operator kill switch");
        assert_eq!(
            gate.state().trip_reason.as_deref(),
            Some("operator kill switch")
        );
        gate.reset_session(dec!(50000));
        assert_eq!(gate.status(), GateStatus::Armed);
        assert_eq!(gate.state().initial_capital, dec!(50000));
        assert!(gate.validate_trade(dec!(100), dec!(99), dec!(10)).is_approved());
    }

    #[test]
    fn test_rejects_non_positive_inputs() {
        let mut gate = gate();
        assert!(matches!(
            gate.validate_trade(dec!(100), dec!(99), Decimal::ZERO).violation(),
            Some(SafetyViolation::InvalidTrade { .. })
        ));
    }

    #[test]
    fn test_denials_are_counted() {
        let metrics = Metrics::new().unwrap();
        let mut gate = gate().with_metrics(metrics.clone());
        gate.validate_trade(dec!(100), dec!(94), dec!(100));
        assert!(metrics
            .render()
            .contains("evotrade_safety_denials_total{reason=\"risk_per_trade\"} 1"));
    }
}
