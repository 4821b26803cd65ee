//! Xahod Domain Layer
//!
//! Pure domain types with zero I/O dependencies.
//! Contains the dashboard records (orders, transactions, transfers,
//! market assets) and the list-query parameter record shared by the
//! query engine, the stores and the HTTP surface.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use entities::{
    Entity, MarketAsset, Order, TradeStatus, TradeType, Transaction, TransactionStatus, Transfer,
    TransferStatus,
};
pub use value_objects::{
    DomainError, ListFilters, ListParams, Pagination, Sorting, SortingOrder, DEFAULT_PAGE,
    DEFAULT_PER_PAGE,
};
