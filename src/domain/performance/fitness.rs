use super::metrics::PerformanceRecord;

/// Below this many closed trades a record is not statistically meaningful
pub const MIN_TRADES: usize = 10;

/// Component weights of the fitness score. They sum to 1.0.
pub struct FitnessWeights;

impl FitnessWeights {
    pub const SHARPE: f64 = 0.40;
    pub const SORTINO: f64 = 0.30;
    pub const WIN_RATE: f64 = 0.20;
    pub const DRAWDOWN: f64 = 0.10;

    // Saturation points
    pub const SHARPE_CAP: f64 = 3.0;
    pub const SORTINO_CAP: f64 = 5.0;
    pub const WIN_RATE_CAP: f64 = 100.0;
    pub const DRAWDOWN_CAP: f64 = 30.0;
}

/// Collapse a performance record into a scalar score in [0, 1]
pub fn calculate_fitness(record: &PerformanceRecord) -> f64 {
    if record.total_trades < MIN_TRADES {
        return 0.0;
    }

    let sharpe = finite_or_zero(record.sharpe_ratio).clamp(0.0, FitnessWeights::SHARPE_CAP)
        / FitnessWeights::SHARPE_CAP;
    let sortino = finite_or_zero(record.sortino_ratio).clamp(0.0, FitnessWeights::SORTINO_CAP)
        / FitnessWeights::SORTINO_CAP;
    let win_rate = finite_or_zero(record.win_rate_pct).clamp(0.0, FitnessWeights::WIN_RATE_CAP)
        / FitnessWeights::WIN_RATE_CAP;

    // A non-finite drawdown scores as the worst case
    let drawdown = if record.max_drawdown_pct.is_finite() {
        (FitnessWeights::DRAWDOWN_CAP - record.max_drawdown_pct.abs())
            .clamp(0.0, FitnessWeights::DRAWDOWN_CAP)
            / FitnessWeights::DRAWDOWN_CAP
    } else {
        0.0
    };

    let score = FitnessWeights::SHARPE * sharpe
        + FitnessWeights::SORTINO * sortino
        + FitnessWeights::WIN_RATE * win_rate
        + FitnessWeights::DRAWDOWN * drawdown;

    score.clamp(0.0, 1.0)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
