#![allow(dead_code)]

use evotrade::domain::trading::types::Candle;
use evotrade::infrastructure::mock::candles_from_closes;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Strictly increasing closes starting at 100
pub fn rising_series(symbol: &str, bars: usize) -> Vec<Candle> {
    let closes: Vec<f64> = (0..bars).map(|i| 100.0 + i as f64 * 0.5).collect();
    candles_from_closes(symbol, &closes)
}

/// Sawtooth that keeps crossing its own averages, so strategies trade often
pub fn choppy_series(symbol: &str, bars: usize) -> Vec<Candle> {
    let closes: Vec<f64> = (0..bars)
        .map(|i| {
            let phase = (i as f64 / 7.0).sin() * 8.0 + (i as f64 / 23.0).cos() * 5.0;
            100.0 + phase + i as f64 * 0.02
        })
        .collect();
    candles_from_closes(symbol, &closes)
}
