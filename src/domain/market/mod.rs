// Strategy kinds, signals and family mappings
pub mod signals;
pub mod strategy_config;
pub mod strategy_family;
