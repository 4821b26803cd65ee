//! Stub fetch collaborator for testing.
//!
//! Serves in-memory collections without making real API calls. Responses can
//! be scripted with a delay to exercise overlapping loads.

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use xahod_domain::{
    Entity, MarketAsset, Order, TradeStatus, TradeType, Transaction, TransactionStatus, Transfer,
    TransferStatus,
};

use crate::error::FetchError;
use crate::ports::{Collection, FetchPort};

/// Scripted one-shot response
struct Scripted {
    delay: Duration,
    response: Result<Collection, FetchError>,
}

/// Stub fetcher for testing.
pub struct StubFetcher {
    /// Current collections by entity
    collections: Mutex<HashMap<Entity, Collection>>,
    /// One-shot responses, served before the stored collections
    script: Mutex<HashMap<Entity, VecDeque<Scripted>>>,
    /// Whether to simulate failures
    fail_next: Mutex<bool>,
    /// Orders the next exchange sync adds to the orders collection
    exchange_orders: Mutex<Vec<Order>>,
    /// Number of fetch_all calls
    calls: AtomicUsize,
}

impl StubFetcher {
    /// Create a stub with empty collections
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            script: Mutex::new(HashMap::new()),
            fail_next: Mutex::new(false),
            exchange_orders: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a stub seeded with a small dashboard data set
    pub fn with_sample_data() -> Self {
        let stub = Self::new();
        for collection in sample_collections() {
            stub.set_collection(collection);
        }
        stub
    }

    /// Replace the stored collection for its entity
    pub fn set_collection(&self, collection: Collection) {
        self.collections.lock().insert(collection.entity(), collection);
    }

    /// Serve `collection` once, after `delay`, for the next fetch of its entity
    pub fn push_response(&self, delay: Duration, collection: Collection) {
        self.script.lock().entry(collection.entity()).or_default().push_back(Scripted {
            delay,
            response: Ok(collection),
        });
    }

    /// Fail the next fetch of `entity` with `error`, after `delay`
    pub fn push_error(&self, entity: Entity, delay: Duration, error: FetchError) {
        self.script.lock().entry(entity).or_default().push_back(Scripted {
            delay,
            response: Err(error),
        });
    }

    /// Orders the next `sync_exchange` brings in
    pub fn set_exchange_orders(&self, orders: Vec<Order>) {
        *self.exchange_orders.lock() = orders;
    }

    /// Configure the next fetch or sync (any entity) to fail
    pub fn set_fail_next(&self, fail: bool) {
        *self.fail_next.lock() = fail;
    }

    /// Number of fetch_all calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn should_fail(&self) -> bool {
        let mut fail_next = self.fail_next.lock();
        std::mem::replace(&mut *fail_next, false)
    }
}

impl Default for StubFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FetchPort for StubFetcher {
    async fn fetch_all(&self, entity: Entity) -> Result<Collection, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.should_fail() {
            return Err(FetchError::Unavailable("Simulated fetch failure".to_string()));
        }

        let scripted = self.script.lock().get_mut(&entity).and_then(|queue| queue.pop_front());
        if let Some(Scripted { delay, response }) = scripted {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            return response;
        }

        let collection = self
            .collections
            .lock()
            .get(&entity)
            .cloned()
            .unwrap_or_else(|| Collection::empty(entity));

        tracing::debug!(entity = %entity, count = collection.len(), "Stub: collection served");
        Ok(collection)
    }

    async fn sync_exchange(&self) -> Result<usize, FetchError> {
        if self.should_fail() {
            return Err(FetchError::Unavailable("Simulated sync failure".to_string()));
        }

        let synced = std::mem::take(&mut *self.exchange_orders.lock());
        let count = synced.len();

        let mut collections = self.collections.lock();
        let entry = collections
            .entry(Entity::Orders)
            .or_insert_with(|| Collection::empty(Entity::Orders));
        if let Collection::Orders(orders) = entry {
            orders.extend(synced);
        }

        tracing::debug!(count, "Stub: exchange orders synced");
        Ok(count)
    }
}

// =============================================================================
// Sample data
// =============================================================================

/// A few records per entity, enough to page and filter in development
pub fn sample_collections() -> Vec<Collection> {
    let mut orders = Vec::new();
    for (i, (trade_type, status)) in [
        (TradeType::Buy, TradeStatus::Open),
        (TradeType::Sell, TradeStatus::Closed),
        (TradeType::Buy, TradeStatus::Closed),
        (TradeType::Sell, TradeStatus::Open),
    ]
    .into_iter()
    .enumerate()
    {
        let mut order =
            Order::new(format!("ORD-{:03}", i + 1), trade_type, status, sample_time(i));
        order.trade_id = format!("T{}", 9000 + i);
        order.currency = "USDT".to_string();
        order.currency_pair = "XRP/USDT".to_string();
        order.price = Decimal::new(52 + i as i64, 2);
        order.quantity = Decimal::from(100 * (i as i64 + 1));
        order.commission = Decimal::new(1, 2);
        order.platform = "bitrue".to_string();
        order.automated = i % 2 == 0;
        orders.push(order);
    }

    let mut transactions = Vec::new();
    for (i, status) in [
        TransactionStatus::Created,
        TransactionStatus::Processing,
        TransactionStatus::Complete,
        TransactionStatus::Failed,
        TransactionStatus::Complete,
    ]
    .into_iter()
    .enumerate()
    {
        let mut tx = Transaction::new(format!("UTID-{:03}", i + 1), status, sample_time(i));
        tx.raddress = format!("rSample{}", i + 1);
        tx.amount_xrp = Decimal::from(50 * (i as i64 + 1));
        tx.amount_xah = Decimal::from(120 * (i as i64 + 1));
        tx.given_rate = Decimal::new(240, 2);
        tx.price_market_xrp = Decimal::new(52, 2);
        tx.price_market_xah = Decimal::new(21, 2);
        transactions.push(tx);
    }

    let mut transfers = Vec::new();
    for (i, status) in [
        TransferStatus::PendingSig,
        TransferStatus::Complete,
        TransferStatus::Submitted,
    ]
    .into_iter()
    .enumerate()
    {
        let mut transfer = Transfer::new(format!("TRF-{:03}", i + 1), status, sample_time(i));
        transfer.from_account = "rColdWallet".to_string();
        transfer.to_acc = "rHotWallet".to_string();
        transfer.amount = Decimal::from(1000 * (i as i64 + 1));
        transfer.currency = "XAH".to_string();
        if status == TransferStatus::Complete {
            transfer.completed_timestamp = sample_time(i + 1);
        }
        transfers.push(transfer);
    }

    let markets = vec![
        MarketAsset::new("XRP/USDT", Some(Decimal::new(52, 2))),
        MarketAsset::new("XAH/USDT", Some(Decimal::new(21, 2))),
        MarketAsset::new("XAH/XRP", None),
    ];

    vec![
        Collection::Orders(orders),
        Collection::Transactions(transactions),
        Collection::Transfers(transfers),
        Collection::Markets(markets),
    ]
}

fn sample_time(offset: usize) -> String {
    format!("2024-03-{:02}T09:30:00Z", offset + 1)
}
