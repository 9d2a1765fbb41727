// Evolution, evaluation and backtesting
pub mod optimization;

// Risk limits applied before trade submission
pub mod risk_management;
