//! Application context.
//!
//! Owns the four entity stores and the fetch collaborator they share.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use xahod_domain::{Entity, MarketAsset, Order, Transaction, Transfer};
use xahod_store::{
    CollectionState, CollectionStore, FetchError, FetchPort, MarketsStore, OrdersStore, Record,
    StoreResult, TransactionsStore, TransfersStore,
};

/// Per-store summary for the status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    pub entity: Entity,
    pub count: usize,
    pub active: usize,
    pub loading: bool,
}

/// Entity stores wired to one fetcher
pub struct AppContext {
    pub orders: Arc<OrdersStore>,
    pub transactions: Arc<TransactionsStore>,
    pub transfers: Arc<TransfersStore>,
    pub markets: Arc<MarketsStore>,
    fetcher: Arc<dyn FetchPort>,
}

impl AppContext {
    /// Build the stores and attach change logging
    pub fn new(fetcher: Arc<dyn FetchPort>) -> Self {
        let context = Self {
            orders: Arc::new(OrdersStore::with_fetcher(Arc::clone(&fetcher))),
            transactions: Arc::new(TransactionsStore::with_fetcher(Arc::clone(&fetcher))),
            transfers: Arc::new(TransfersStore::with_fetcher(Arc::clone(&fetcher))),
            markets: Arc::new(MarketsStore::with_fetcher(Arc::clone(&fetcher))),
            fetcher,
        };

        log_changes(&context.orders);
        log_changes(&context.transactions);
        log_changes(&context.transfers);
        log_changes(&context.markets);

        context
    }

    /// Load every store concurrently.
    ///
    /// A failed load leaves that store's previous contents in place.
    pub async fn load_all(&self) -> StoreResult<()> {
        let (orders, transactions, transfers, markets) = tokio::join!(
            self.orders.load(),
            self.transactions.load(),
            self.transfers.load(),
            self.markets.load(),
        );
        orders?;
        transactions?;
        transfers?;
        markets?;

        info!(
            orders = self.orders.len(),
            transactions = self.transactions.len(),
            transfers = self.transfers.len(),
            markets = self.markets.len(),
            "Stores loaded"
        );
        Ok(())
    }

    /// Summary of every store, in entity order
    pub fn status(&self) -> Vec<StoreStatus> {
        vec![
            summarize(&self.orders),
            summarize(&self.transactions),
            summarize(&self.transfers),
            summarize(&self.markets),
        ]
    }

    /// Check the fetch collaborator
    pub async fn health(&self) -> Result<(), FetchError> {
        self.fetcher.health_check().await
    }
}

fn log_changes<T: Record>(store: &CollectionStore<T>) {
    // registration lives as long as the store
    let _ = store.subscribe(|name, state: &CollectionState<T>| {
        debug!(
            store = T::ENTITY.as_str(),
            mutation = name,
            count = state.items.len(),
            loading = state.loading,
            "Store changed"
        );
    });
}

fn summarize<T: Record>(store: &CollectionStore<T>) -> StoreStatus {
    store.read(|state| StoreStatus {
        entity: T::ENTITY,
        count: state.items.len(),
        active: state.items.iter().filter(|r| r.is_active()).count(),
        loading: state.loading,
    })
}

/// Store lookup by record type
pub trait EntityStore: Record {
    /// The context's store for this record
    fn store(context: &AppContext) -> &Arc<CollectionStore<Self>>;
}

impl EntityStore for Order {
    fn store(context: &AppContext) -> &Arc<CollectionStore<Self>> {
        &context.orders
    }
}

impl EntityStore for Transaction {
    fn store(context: &AppContext) -> &Arc<CollectionStore<Self>> {
        &context.transactions
    }
}

impl EntityStore for Transfer {
    fn store(context: &AppContext) -> &Arc<CollectionStore<Self>> {
        &context.transfers
    }
}

impl EntityStore for MarketAsset {
    fn store(context: &AppContext) -> &Arc<CollectionStore<Self>> {
        &context.markets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xahod_store::StubFetcher;

    #[tokio::test]
    async fn test_load_all_from_sample_data() {
        let context = AppContext::new(Arc::new(StubFetcher::with_sample_data()));

        context.load_all().await.unwrap();

        let status = context.status();
        let counts: Vec<(Entity, usize, usize)> =
            status.iter().map(|s| (s.entity, s.count, s.active)).collect();
        assert_eq!(
            counts,
            vec![
                (Entity::Orders, 4, 2),
                (Entity::Transactions, 5, 3),
                (Entity::Transfers, 3, 2),
                (Entity::Markets, 3, 3),
            ]
        );
        assert!(status.iter().all(|s| !s.loading));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_empty_stores() {
        let stub = Arc::new(StubFetcher::with_sample_data());
        stub.set_fail_next(true);
        let context = AppContext::new(stub);

        context.load_all().await.unwrap();

        // exactly one of the concurrent loads failed
        let loaded: usize = context.status().iter().filter(|s| s.count > 0).count();
        assert_eq!(loaded, 3);
    }

    #[tokio::test]
    async fn test_health_uses_fetcher() {
        let context = AppContext::new(Arc::new(StubFetcher::new()));
        assert!(context.health().await.is_ok());
    }

    #[test]
    fn test_entity_store_lookup() {
        let context = AppContext::new(Arc::new(StubFetcher::new()));
        assert_eq!(<Order as EntityStore>::store(&context).id(), "orders");
        assert_eq!(<MarketAsset as EntityStore>::store(&context).id(), "markets");
    }
}
