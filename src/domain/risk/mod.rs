// Trade safety domain
pub mod risk_config;
pub mod state;
pub mod validation;
