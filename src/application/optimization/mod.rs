// Genetic optimization and backtesting
pub mod engine;
pub mod parallel_evaluator;
pub mod population;
pub mod reporting;
pub mod simulator;
