//! Entity store load flows against the stub fetcher

use parking_lot::Mutex;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use xahod_domain::{
    Entity, ListParams, MarketAsset, Order, SortingOrder, TradeStatus, TradeType, Transaction,
    TransactionStatus,
};
use xahod_store::{
    Collection, CollectionMutation, FetchError, FetchPort, ListView, MarketsStore, OrdersStore,
    StoreError, StubFetcher, TransactionsStore,
};

fn order(utid: &str, status: TradeStatus) -> Order {
    Order::new(utid, TradeType::Buy, status, "2024-01-01T00:00:00Z")
}

#[tokio::test]
async fn test_load_commits_collection_and_toggles_loading() {
    let stub = Arc::new(StubFetcher::new());
    stub.set_collection(Collection::Orders(vec![
        order("A", TradeStatus::Open),
        order("B", TradeStatus::Closed),
    ]));
    let store = OrdersStore::with_fetcher(stub.clone());
    let names = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&names);
    let _sub = store.subscribe(move |name, _| sink.lock().push(name.to_string()));

    store.load().await.unwrap();

    assert_eq!(store.len(), 2);
    assert!(!store.is_loading());
    assert_eq!(
        names.lock().as_slice(),
        &["setLoading", "setOrders", "setLoading"]
    );
    assert_eq!(stub.call_count(), 1);
}

#[tokio::test]
async fn test_failed_load_keeps_previous_collection() {
    let stub = Arc::new(StubFetcher::new());
    stub.set_collection(Collection::Orders(vec![order("A", TradeStatus::Open)]));
    let store = OrdersStore::with_fetcher(stub.clone());
    store.load().await.unwrap();

    stub.set_collection(Collection::Orders(vec![]));
    stub.set_fail_next(true);
    store.load().await.unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.find("A").map(|o| o.status), Some(TradeStatus::Open));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_wrong_collection_is_a_failed_load() {
    let stub = Arc::new(StubFetcher::new());
    stub.push_error(
        Entity::Markets,
        Duration::ZERO,
        FetchError::EntityMismatch {
            expected: Entity::Markets,
            actual: Entity::Orders,
        },
    );
    let store = MarketsStore::with_fetcher(stub);
    store.commit(CollectionMutation::Add(MarketAsset::new("XRP/USDT", None)));

    store.load().await.unwrap();

    assert_eq!(store.len(), 1);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_overlapping_loads_last_issued_wins() {
    let stub = Arc::new(StubFetcher::new());
    // first request answers late with old data
    stub.push_response(
        Duration::from_millis(80),
        Collection::Orders(vec![order("OLD", TradeStatus::Open)]),
    );
    stub.push_response(
        Duration::from_millis(5),
        Collection::Orders(vec![order("NEW-1", TradeStatus::Open), order("NEW-2", TradeStatus::Open)]),
    );
    let store = OrdersStore::with_fetcher(stub);

    let (first, second) = tokio::join!(store.load(), store.load());
    first.unwrap();
    second.unwrap();

    let keys: Vec<String> = store.all().into_iter().map(|o| o.utid).collect();
    assert_eq!(keys, vec!["NEW-1", "NEW-2"]);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_named_dispatch_surface() {
    let store = TransactionsStore::with_fetcher(Arc::new(StubFetcher::new()));
    let tx = Transaction::new("T1", TransactionStatus::Pending, "2024-01-01T00:00:00Z");

    store
        .dispatch_named("addTransaction", serde_json::to_value(&tx).unwrap())
        .await
        .unwrap();
    assert_eq!(store.len(), 1);

    let mut done = tx.clone();
    done.status = TransactionStatus::Complete;
    store
        .dispatch_named("updateTransaction", serde_json::to_value(&done).unwrap())
        .await
        .unwrap();
    assert_eq!(store.completed().len(), 1);

    store.dispatch_named("removeTransaction", json!("T1")).await.unwrap();
    assert!(store.is_empty());

    let err = store.dispatch_named("addOrder", json!({})).await.unwrap_err();
    assert!(matches!(err, StoreError::UnknownAction { .. }));

    let err = store.dispatch_named("addTransaction", json!({"utid": 3})).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidPayload { .. }));
}

#[tokio::test]
async fn test_reset_restores_empty_collection() {
    let store = OrdersStore::with_fetcher(Arc::new(StubFetcher::with_sample_data()));
    store.load().await.unwrap();
    assert!(!store.is_empty());

    store.reset();

    assert!(store.is_empty());
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_patch_updates_price_in_place() {
    let store = MarketsStore::with_fetcher(Arc::new(StubFetcher::with_sample_data()));
    store.load().await.unwrap();

    store.patch(|state| {
        for asset in state.items.iter_mut().filter(|a| a.pair == "XAH/XRP") {
            asset.last_price = Some(dec!(0.4));
        }
    });

    assert_eq!(store.find("XAH/XRP").and_then(|a| a.last_price), Some(dec!(0.4)));
}

#[tokio::test]
async fn test_store_query_and_list_view_over_loaded_store() {
    let store = Arc::new(TransactionsStore::with_fetcher(Arc::new(
        StubFetcher::with_sample_data(),
    )));
    store.load().await.unwrap();

    let page = store
        .query(&ListParams {
            is_active: Some(true),
            sort_by: Some("amount_xrp".to_string()),
            sorting_order: Some(SortingOrder::Desc),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(page.pagination.total, 3);
    assert!(page.data.iter().all(|t| t.active));
    assert!(page.data[0].amount_xrp > page.data[2].amount_xrp);

    let mut view: ListView<Transaction, TransactionsStore> = ListView::new(store);
    view.fetch().await.unwrap();
    // default screen shows completed transactions
    assert_eq!(view.state().pagination.total, 2);
    assert!(view.items().iter().all(|t| t.status == TransactionStatus::Complete));
}

#[tokio::test]
async fn test_sync_exchange_reloads_orders() {
    let stub = Arc::new(StubFetcher::with_sample_data());
    stub.set_exchange_orders(vec![order("EX-1", TradeStatus::Open)]);
    let store = OrdersStore::with_fetcher(stub.clone());
    let names = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&names);
    let _sub = store.subscribe(move |name, _| sink.lock().push(name.to_string()));

    store.dispatch_named("syncExchange", serde_json::Value::Null).await.unwrap();

    assert_eq!(store.len(), 5);
    assert!(store.find("EX-1").is_some());
    assert!(!store.is_loading());
    assert_eq!(
        names.lock().as_slice(),
        &["setLoading", "setOrders", "setLoading"]
    );
}

#[tokio::test]
async fn test_failed_sync_clears_loading_and_keeps_orders() {
    let stub = Arc::new(StubFetcher::with_sample_data());
    let store = OrdersStore::with_fetcher(stub.clone());
    store.load().await.unwrap();
    let calls = stub.call_count();

    stub.set_fail_next(true);
    store.sync_exchange().await.unwrap();

    assert_eq!(store.len(), 4);
    assert!(!store.is_loading());
    assert!(matches!(store.last_load_error(), Some(FetchError::Unavailable(_))));
    // no reload after a failed sync
    assert_eq!(stub.call_count(), calls);
}

#[tokio::test]
async fn test_sync_exchange_unavailable_by_default() {
    struct Bare;

    #[async_trait::async_trait]
    impl FetchPort for Bare {
        async fn fetch_all(&self, entity: Entity) -> Result<Collection, FetchError> {
            Ok(Collection::empty(entity))
        }
    }

    assert!(matches!(Bare.sync_exchange().await, Err(FetchError::Unavailable(_))));
}
