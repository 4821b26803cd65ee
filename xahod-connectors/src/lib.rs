//! Xahod Data Connectors
//!
//! Adapters for the dashboard data API (REST).
//! Normalizes wire pages and the market snapshot to domain records and
//! implements the store layer's `FetchPort`.

#![warn(clippy::all)]

// Public modules
pub mod data_api;

// Re-exports
pub use data_api::{
    normalize_next_link, parse_market_snapshot, DataApiClient, DataApiError, DataApiPage,
    MarketTick, DEFAULT_TIMEOUT_SECS,
};
