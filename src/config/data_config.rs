use super::parse_or;
use crate::domain::errors::ConfigError;
use crate::domain::ports::MarketDataService;
use crate::infrastructure::{CsvMarketDataService, SyntheticMarketDataService};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Where historical bars come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Seeded random walk, no files needed
    Synthetic,
    /// One `<SYMBOL>.csv` per symbol under `DATA_DIR`
    Csv,
}

impl std::str::FromStr for DataSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "synthetic" | "mock" => Ok(DataSource::Synthetic),
            "csv" => Ok(DataSource::Csv),
            _ => Err(ConfigError::UnknownDataSource(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataEnvConfig {
    pub source: DataSource,
    pub data_dir: PathBuf,
    pub synthetic_seed: u64,
}

impl DataEnvConfig {
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            source: parse_or(lookup, "DATA_SOURCE", DataSource::Synthetic)?,
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            synthetic_seed: parse_or(lookup, "SYNTHETIC_SEED", 42)?,
        })
    }

    pub fn build_market_data(&self) -> Arc<dyn MarketDataService> {
        match self.source {
            DataSource::Synthetic => Arc::new(SyntheticMarketDataService::new(self.synthetic_seed)),
            DataSource::Csv => Arc::new(CsvMarketDataService::new(&self.data_dir)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::vars;

    #[test]
    fn test_csv_source() {
        let config = DataEnvConfig::from_lookup(&vars(&[
            ("DATA_SOURCE", "CSV"),
            ("DATA_DIR", "/srv/bars"),
        ]))
        .unwrap();
        assert_eq!(config.source, DataSource::Csv);
        assert_eq!(config.data_dir, PathBuf::from("/srv/bars"));
    }

    #[test]
    fn test_unknown_source_fails() {
        let err = DataEnvConfig::from_lookup(&vars(&[("DATA_SOURCE", "alpaca")])).unwrap_err();
        assert!(format!("{:#}", err).contains("alpaca"));
    }
}
