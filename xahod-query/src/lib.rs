//! Xahod Query Engine
//!
//! Pure list-query pipeline, deterministic, no I/O.
//! Takes a collection and `ListParams` → Returns one page plus pagination.
//!
//! # Architecture
//!
//! - **Field table**: each record declares its fields with a semantic kind
//!   (text, number, timestamp, flag) and whether free-text search covers it
//! - **Pipeline**: active filter → search → sort → paginate
//! - **Records**: `Queryable` implementations for the four dashboard entities
//!
//! # Usage
//!
//! ```rust
//! use xahod_domain::{ListParams, MarketAsset, SortingOrder};
//! use xahod_query::query;
//!
//! let markets = vec![
//!     MarketAsset::new("XRP/USDT", None),
//!     MarketAsset::new("BTC/USDT", None),
//! ];
//! let params = ListParams {
//!     sort_by: Some("pair".to_string()),
//!     sorting_order: Some(SortingOrder::Asc),
//!     ..Default::default()
//! };
//!
//! let page = query(&markets, &params).unwrap();
//! assert_eq!(page.data[0].pair, "BTC/USDT");
//! assert_eq!(page.pagination.total, 2);
//! ```

#![warn(clippy::all)]

mod error;
mod field;
mod pipeline;
mod records;

pub use error::QueryError;
pub use field::{parse_instant, FieldKind, FieldSpec, FieldValue, Queryable, SortKey};
pub use pipeline::{filter_active, paginate, query, search, sort, Page};
