// Performance measurement domain
pub mod fitness;
pub mod metrics;
pub mod stats;
