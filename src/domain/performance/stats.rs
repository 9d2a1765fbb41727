use statrs::statistics::{Data, Distribution};

/// Trading days per year, used to annualize daily ratios
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

const MIN_STD_DEV: f64 = 1e-12;

/// Shared statistics utilities for financial calculations.
pub struct Stats;

impl Stats {
    /// Simple period-over-period returns. Points with a non-positive previous value are skipped.
    pub fn daily_returns(values: &[f64]) -> Vec<f64> {
        values
            .windows(2)
            .filter(|w| w[0] > 0.0)
            .map(|w| (w[1] - w[0]) / w[0])
            .collect()
    }

    /// Annualized Sharpe ratio: mean / sample std · √252.
    /// Returns 0.0 with fewer than two returns or a flat series.
    pub fn sharpe_ratio(returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }

        let data = Data::new(returns.to_vec());
        let (Some(mean), Some(std_dev)) = (data.mean(), data.std_dev()) else {
            return 0.0;
        };

        annualized(mean, std_dev)
    }

    /// Annualized Sortino ratio: mean of all returns over the downside deviation,
    /// sqrt(Σ r² / n) over the negative returns, measured from zero.
    /// Returns 0.0 when there are no negative returns.
    pub fn sortino_ratio(returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }

        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        if downside.is_empty() {
            return 0.0;
        }

        let Some(mean) = Data::new(returns.to_vec()).mean() else {
            return 0.0;
        };
        let downside_dev =
            (downside.iter().map(|r| r * r).sum::<f64>() / downside.len() as f64).sqrt();

        annualized(mean, downside_dev)
    }

    /// Maximum drawdown as a fraction: min over bars of (value - running_peak) / running_peak.
    /// Always ≤ 0.
    pub fn max_drawdown(values: &[f64]) -> f64 {
        let mut peak = f64::MIN;
        let mut worst = 0.0_f64;

        for &value in values {
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                let dd = (value - peak) / peak;
                if dd < worst {
                    worst = dd;
                }
            }
        }

        worst
    }
}

fn annualized(mean: f64, std_dev: f64) -> f64 {
    if !mean.is_finite() || !std_dev.is_finite() || std_dev < MIN_STD_DEV {
        return 0.0;
    }
    mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
}
