//! Xahod Store Layer
//!
//! Reactive state containers for the dashboard entity collections.
//!
//! # Architecture
//!
//! - **Store engine**: `Store<D>` with commit, dispatch, subscribe, patch and
//!   reset over any `StoreDefinition`
//! - **Collection stores**: one generic definition instantiated for orders,
//!   transactions, transfers and market assets
//! - **Fetch port**: `FetchPort` trait for loading whole collections, with a
//!   stub implementation for tests
//! - **List view**: per-screen filters, sorting and pagination over a
//!   `PageSource`
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use xahod_domain::ListParams;
//! use xahod_store::{OrdersStore, StubFetcher};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = OrdersStore::with_fetcher(Arc::new(StubFetcher::with_sample_data()));
//!
//!     store.load().await.unwrap();
//!     let page = store.query(&ListParams::default()).unwrap();
//!     println!("Orders: {} of {}", page.data.len(), page.pagination.total);
//! }
//! ```

#![warn(clippy::all)]

mod collection;
mod error;
mod generation;
mod list_view;
mod ports;
mod store;
mod stub;

pub use collection::{
    CollectionAction, CollectionDefinition, CollectionMutation, CollectionState, CollectionStore,
    MarketsStore, OrdersStore, Placement, Record, TransactionsStore, TransfersStore,
};
pub use error::{FetchError, StoreError, StoreResult};
pub use generation::RequestGeneration;
pub use list_view::{ListOptions, ListState, ListView, PageSource};
pub use ports::{Collection, FetchPort};
pub use store::{
    Operation, OperationError, Store, StoreDefinition, Subscription, PATCH, RESET,
};
pub use stub::{sample_collections, StubFetcher};
