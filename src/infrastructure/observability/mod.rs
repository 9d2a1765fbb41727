//! Push-based observability for evotrade
//!
//! Metrics are collected in a Prometheus registry and rendered as text on
//! demand. Nothing listens for incoming requests.

pub mod metrics;

pub use metrics::Metrics;
