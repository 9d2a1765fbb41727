//! Per-bar trading signals for each strategy kind.
//!
//! Indicators come from `ta`; warm-up is tracked by bar index so bars before an
//! indicator has a full window always hold.

use super::strategy_config::{RsiParams, SmaCrossoverParams, StrategyKind};
use crate::domain::errors::BacktestError;
use crate::domain::evolution::dna::Dna;
use ta::Next;
use ta::indicators::{RelativeStrengthIndex, SimpleMovingAverage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Sell,
    Hold,
    Buy,
}

/// One signal per close, in order
pub fn generate_signals(closes: &[f64], kind: &StrategyKind) -> Result<Vec<Signal>, BacktestError> {
    match kind {
        StrategyKind::SmaCrossover(params) => sma_crossover_signals(closes, params),
        StrategyKind::RsiStrategy(params) => rsi_signals(closes, params),
        StrategyKind::EvolutionDna(dna) => dna_signals(closes, dna),
    }
}

fn sma_crossover_signals(
    closes: &[f64],
    params: &SmaCrossoverParams,
) -> Result<Vec<Signal>, BacktestError> {
    let fast = sma_series(closes, params.fast_period)?;
    let slow = sma_series(closes, params.slow_period)?;

    Ok(fast
        .into_iter()
        .zip(slow)
        .map(|pair| match pair {
            (Some(f), Some(s)) if f > s => Signal::Buy,
            (Some(_), Some(_)) => Signal::Sell,
            _ => Signal::Hold,
        })
        .collect())
}

fn rsi_signals(closes: &[f64], params: &RsiParams) -> Result<Vec<Signal>, BacktestError> {
    let rsi = rsi_series(closes, params.period)?;

    Ok(rsi
        .into_iter()
        .map(|value| match value {
            Some(r) if r < params.oversold => Signal::Buy,
            Some(r) if r > params.overbought => Signal::Sell,
            _ => Signal::Hold,
        })
        .collect())
}

/// Buy on an oversold dip within an uptrend; sell when overbought or the trend breaks
fn dna_signals(closes: &[f64], dna: &Dna) -> Result<Vec<Signal>, BacktestError> {
    let rsi = rsi_series(closes, dna.rsi_period())?;
    let slow_ma = sma_series(closes, dna.ma_slow())?;
    let oversold = dna.rsi_oversold() as f64;
    let overbought = dna.rsi_overbought() as f64;

    Ok(closes
        .iter()
        .zip(rsi)
        .zip(slow_ma)
        .map(|((&close, rsi), ma)| match (rsi, ma) {
            (Some(r), Some(m)) if r < oversold && close > m => Signal::Buy,
            (Some(r), Some(m)) if r > overbought || close < m => Signal::Sell,
            _ => Signal::Hold,
        })
        .collect())
}

/// SMA per bar, `None` until `period` closes have been seen
fn sma_series(closes: &[f64], period: u32) -> Result<Vec<Option<f64>>, BacktestError> {
    let period = period as usize;
    let mut sma = SimpleMovingAverage::new(period)
        .map_err(|e| BacktestError::InvalidParameters(format!("SMA({}): {:?}", period, e)))?;

    Ok(closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let value = sma.next(close);
            (i + 1 >= period && value.is_finite()).then_some(value)
        })
        .collect())
}

/// RSI per bar, `None` until `period` price changes have been seen
fn rsi_series(closes: &[f64], period: u32) -> Result<Vec<Option<f64>>, BacktestError> {
    let period = period as usize;
    let mut rsi = RelativeStrengthIndex::new(period)
        .map_err(|e| BacktestError::InvalidParameters(format!("RSI({}): {:?}", period, e)))?;

    Ok(closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let value = rsi.next(close);
            (i >= period && value.is_finite()).then_some(value)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evolution::dna::DnaParams;

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn test_sma_warmup_holds() {
        let kind = StrategyKind::SmaCrossover(SmaCrossoverParams {
            fast_period: 3,
            slow_period: 5,
        });
        let signals = generate_signals(&rising(10), &kind).unwrap();
        assert_eq!(signals.len(), 10);
        assert!(signals[..4].iter().all(|s| *s == Signal::Hold));
        assert!(signals[4..].iter().all(|s| *s == Signal::Buy));
    }

    #[test]
    fn test_sma_sells_in_downtrend() {
        let falling: Vec<f64> = (0..20).map(|i| 200.0 - i as f64).collect();
        let kind = StrategyKind::SmaCrossover(SmaCrossoverParams {
            fast_period: 2,
            slow_period: 4,
        });
        let signals = generate_signals(&falling, &kind).unwrap();
        assert_eq!(signals[19], Signal::Sell);
    }

    #[test]
    fn test_rsi_overbought_in_uptrend() {
        let kind = StrategyKind::RsiStrategy(RsiParams::default());
        let signals = generate_signals(&rising(40), &kind).unwrap();
        assert!(signals[..14].iter().all(|s| *s == Signal::Hold));
        assert_eq!(signals[39], Signal::Sell);
    }

    #[test]
    fn test_rsi_oversold_in_downtrend() {
        let falling: Vec<f64> = (0..40).map(|i| 200.0 - i as f64).collect();
        let kind = StrategyKind::RsiStrategy(RsiParams::default());
        let signals = generate_signals(&falling, &kind).unwrap();
        assert_eq!(signals[39], Signal::Buy);
    }

    #[test]
    fn test_dna_sells_when_price_below_slow_ma() {
        let dna = Dna::new(DnaParams {
            ma_fast: 2,
            ma_slow: 5,
            rsi_period: 3,
            ..DnaParams::default()
        })
        .unwrap();
        let falling: Vec<f64> = (0..12).map(|i| 100.0 - i as f64).collect();
        let signals = generate_signals(&falling, &StrategyKind::EvolutionDna(dna)).unwrap();
        assert!(signals[..4].iter().all(|s| *s == Signal::Hold));
        assert_eq!(signals[11], Signal::Sell);
    }

    #[test]
    fn test_empty_input() {
        let kind = StrategyKind::SmaCrossover(SmaCrossoverParams::default());
        assert!(generate_signals(&[], &kind).unwrap().is_empty());
    }
}
