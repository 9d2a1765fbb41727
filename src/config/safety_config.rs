use super::parse_or;
use crate::domain::risk::risk_config::SafetyConfig;
use anyhow::{Context, Result};
use rust_decimal::Decimal;

/// Safety gate environment configuration. Percent keys are fractions (0.02 = 2%).
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyEnvConfig {
    pub max_daily_loss_pct: Decimal,
    pub max_consecutive_losses: u32,
    pub max_trades_per_day: u32,
    pub max_position_size_pct: Decimal,
    pub max_risk_per_trade_pct: Decimal,
}

impl SafetyEnvConfig {
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = SafetyConfig::default();
        let config = Self {
            max_daily_loss_pct: parse_or(
                lookup,
                "SAFETY_MAX_DAILY_LOSS_PCT",
                defaults.max_daily_loss_pct,
            )?,
            max_consecutive_losses: parse_or(
                lookup,
                "SAFETY_MAX_CONSECUTIVE_LOSSES",
                defaults.max_consecutive_losses,
            )?,
            max_trades_per_day: parse_or(
                lookup,
                "SAFETY_MAX_TRADES_PER_DAY",
                defaults.max_trades_per_day,
            )?,
            max_position_size_pct: parse_or(
                lookup,
                "SAFETY_MAX_POSITION_SIZE_PCT",
                defaults.max_position_size_pct,
            )?,
            max_risk_per_trade_pct: parse_or(
                lookup,
                "SAFETY_MAX_RISK_PER_TRADE_PCT",
                defaults.max_risk_per_trade_pct,
            )?,
        };

        config
            .to_safety_config()
            .validate()
            .context("Safety limits out of range")?;
        Ok(config)
    }

    pub fn to_safety_config(&self) -> SafetyConfig {
        SafetyConfig {
            max_daily_loss_pct: self.max_daily_loss_pct,
            max_consecutive_losses: self.max_consecutive_losses,
            max_trades_per_day: self.max_trades_per_day,
            max_position_size_pct: self.max_position_size_pct,
            max_risk_per_trade_pct: self.max_risk_per_trade_pct,
        }
    }
}
