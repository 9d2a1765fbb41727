// Genome, candidates and generation reports
pub mod evolution;

// Strategy kinds and signal generation
pub mod market;

// Backtest metrics and fitness
pub mod performance;

// Port interfaces
pub mod ports;

// Trade safety limits and state
pub mod risk;

// Core trading value objects
pub mod trading;

// Domain-specific error types
pub mod errors;
