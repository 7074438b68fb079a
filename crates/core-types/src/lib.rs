pub mod error;
pub mod structs;
pub mod town;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use structs::{MarketDataRecord, NewMarketData, UserAccount};
pub use town::Town;
