pub mod csv_market_data;
pub mod mock;
pub mod observability;
pub mod repositories;

pub use csv_market_data::CsvMarketDataService;
pub use mock::SyntheticMarketDataService;
pub use repositories::InMemoryResultsSink;
