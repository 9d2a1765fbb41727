use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised when a DNA record violates its gene bounds
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DnaError {
    #[error("Gene {gene} out of range: {value} (allowed {min}..={max})")]
    OutOfRange {
        gene: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("ma_fast ({fast}) must be below ma_slow ({slow})")]
    MovingAverageOrder { fast: u32, slow: u32 },

    #[error("Gene {gene} must be finite, got {value}")]
    NotFinite { gene: &'static str, value: f64 },
}

/// Errors produced by a single backtest run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error("Data unavailable for {symbol} ({period}): {reason}")]
    DataUnavailable {
        symbol: String,
        period: String,
        reason: String,
    },

    #[error("Invalid strategy parameters: {0}")]
    InvalidParameters(String),
}

impl BacktestError {
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, BacktestError::DataUnavailable { .. })
    }
}

/// Configuration errors. These fail fast instead of degrading to fitness 0.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error(
        "Unknown strategy kind: {0}. Must be 'SMA_CROSSOVER', 'RSI_STRATEGY' or 'EVOLUTION_DNA'"
    )]
    UnknownStrategy(String),

    #[error("Unknown strategy family: {0}")]
    UnknownFamily(String),

    #[error("Unknown backtest period: {0}. Must be one of 1mo, 3mo, 6mo, 1y, 2y, 5y")]
    UnknownPeriod(String),

    #[error("Unknown data source: {0}. Must be 'synthetic' or 'csv'")]
    UnknownDataSource(String),

    #[error("Population size {size} is too small (minimum {min})")]
    PopulationTooSmall { size: usize, min: usize },

    #[error("Invalid {name}: {value} (must be within 0..=1)")]
    InvalidRate { name: &'static str, value: f64 },
}

/// Errors contained at the granularity of one evaluation unit
/// (one candidate, one strategy family, one backtest)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Backtest(#[from] BacktestError),

    #[error("Evaluation of {organism_id} timed out after {timeout_secs}s")]
    Timeout { organism_id: String, timeout_secs: u64 },

    #[error("Evaluation worker for {organism_id} failed: {reason}")]
    WorkerFailed { organism_id: String, reason: String },
}

/// Reasons the safety gate denies a trade. Returned, never thrown.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SafetyViolation {
    #[error("Circuit breaker active: {reason}")]
    CircuitBreakerActive { reason: String },

    #[error("Daily loss limit breached: {loss_pct:.2}% (limit: {limit_pct:.2}%)")]
    DailyLossLimit { loss_pct: Decimal, limit_pct: Decimal },

    #[error("Consecutive loss limit reached: {count} losses (limit: {limit})")]
    ConsecutiveLossLimit { count: u32, limit: u32 },

    #[error("Daily trade limit reached: {count} trades (limit: {limit})")]
    DailyTradeLimit { count: u32, limit: u32 },

    #[error("Invalid trade: {reason}")]
    InvalidTrade { reason: String },

    #[error("Position size limit exceeded: {position_pct:.2}% of capital > {max_pct:.2}%")]
    PositionSizeLimit {
        position_value: Decimal,
        position_pct: Decimal,
        max_pct: Decimal,
    },

    #[error(
        "Risk per trade limit exceeded: risk ${risk_amount} is {risk_pct:.2}% of capital > {max_pct:.2}%"
    )]
    RiskPerTradeLimit {
        risk_amount: Decimal,
        risk_pct: Decimal,
        max_pct: Decimal,
    },
}

impl SafetyViolation {
    /// Whether this violation trips the circuit breaker (hard block)
    pub fn trips_breaker(&self) -> bool {
        matches!(
            self,
            SafetyViolation::DailyLossLimit { .. } | SafetyViolation::ConsecutiveLossLimit { .. }
        )
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            SafetyViolation::CircuitBreakerActive { .. } => "circuit_breaker",
            SafetyViolation::DailyLossLimit { .. } => "daily_loss",
            SafetyViolation::ConsecutiveLossLimit { .. } => "consecutive_losses",
            SafetyViolation::DailyTradeLimit { .. } => "daily_trades",
            SafetyViolation::InvalidTrade { .. } => "invalid_trade",
            SafetyViolation::PositionSizeLimit { .. } => "position_size",
            SafetyViolation::RiskPerTradeLimit { .. } => "risk_per_trade",
        }
    }
}
