use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Error type for SafetyConfig validation
#[derive(Debug, thiserror::Error)]
pub enum SafetyConfigError {
    #[error("Invalid SafetyConfig: {0}")]
    ValidationError(String),
}

/// Hard limits enforced by the safety gate. Fractions, not percents (0.02 = 2%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyConfig {
    pub max_daily_loss_pct: Decimal, // Loss of initial capital that trips the breaker
    pub max_consecutive_losses: u32, // Losing streak that trips the breaker
    pub max_trades_per_day: u32,     // Soft cap, no trip
    pub max_position_size_pct: Decimal, // Of current capital
    pub max_risk_per_trade_pct: Decimal, // |entry - stop| * qty, of current capital
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_daily_loss_pct: dec!(0.02),
            max_consecutive_losses: 5,
            max_trades_per_day: 20,
            max_position_size_pct: dec!(0.20),
            max_risk_per_trade_pct: dec!(0.005),
        }
    }
}

impl SafetyConfig {
    pub fn validate(&self) -> Result<(), SafetyConfigError> {
        let unit = Decimal::ZERO..=Decimal::ONE;
        if self.max_daily_loss_pct <= Decimal::ZERO || !unit.contains(&self.max_daily_loss_pct) {
            return Err(SafetyConfigError::ValidationError(format!(
                "max_daily_loss_pct must be within (0, 1]: {}",
                self.max_daily_loss_pct
            )));
        }
        if self.max_position_size_pct <= Decimal::ZERO
            || !unit.contains(&self.max_position_size_pct)
        {
            return Err(SafetyConfigError::ValidationError(format!(
                "max_position_size_pct must be within (0, 1]: {}",
                self.max_position_size_pct
            )));
        }
        if self.max_risk_per_trade_pct <= Decimal::ZERO
            || !unit.contains(&self.max_risk_per_trade_pct)
        {
            return Err(SafetyConfigError::ValidationError(format!(
                "max_risk_per_trade_pct must be within (0, 1]: {}",
                self.max_risk_per_trade_pct
            )));
        }
        if self.max_consecutive_losses == 0 {
            return Err(SafetyConfigError::ValidationError(
                "max_consecutive_losses must be > 0".to_string(),
            ));
        }
        if self.max_trades_per_day == 0 {
            return Err(SafetyConfigError::ValidationError(
                "max_trades_per_day must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
