//! Entity collection stores
//!
//! One `StoreDefinition` serves all four dashboard entities. The record type
//! decides its key, insert placement, mutation names and list defaults
//! through the `Record` trait.
//!
//! # Mutations and actions
//!
//! | Mutation                     | Action            |
//! |------------------------------|-------------------|
//! | `set<Plural>`                | `load`            |
//! | `setLoading`                 |                   |
//! | `add<Singular>` (upsert)     | `add<Singular>`   |
//! | `update<Singular>`           | `update<Singular>`|
//! | `remove<Singular>`           | `remove<Singular>`|
//! |                              | `syncExchange` (orders only) |

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info, warn};
use xahod_domain::{
    Entity, ListFilters, ListParams, MarketAsset, Order, Sorting, SortingOrder, Transaction,
    Transfer,
};
use xahod_query::{query, Page, Queryable};

use crate::error::{FetchError, StoreError, StoreResult};
use crate::generation::RequestGeneration;
use crate::ports::{Collection, FetchPort};
use crate::store::{Operation, OperationError, Store, StoreDefinition};

// =============================================================================
// Record
// =============================================================================

/// Where `add` inserts a record whose key is not present yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Newest first
    Front,
    /// Appended
    Back,
}

/// A dashboard record that can live in a collection store.
pub trait Record: Queryable + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Entity addressed at the fetch collaborator
    const ENTITY: Entity;
    /// Singular name used in mutation names (`addOrder`)
    const SINGULAR: &'static str;
    /// Plural name used in mutation names (`setOrders`)
    const PLURAL: &'static str;
    /// Insert position for new keys
    const PLACEMENT: Placement = Placement::Front;
    /// Whether the `syncExchange` action applies
    const EXCHANGE_SYNC: bool = false;

    /// Stable key
    fn key(&self) -> &str;

    /// Merge `incoming` into the existing record with the same key
    fn absorb(&mut self, incoming: Self) {
        *self = incoming;
    }

    /// Extract this entity's records, rejecting other collections
    fn from_collection(collection: Collection) -> Result<Vec<Self>, FetchError>;

    /// Initial sorting of the list screen
    fn default_sorting() -> Sorting;

    /// Initial filters of the list screen
    fn default_filters() -> ListFilters {
        ListFilters {
            is_active: Some(false),
            search: Some(String::new()),
        }
    }
}

fn mismatch(expected: Entity, collection: &Collection) -> FetchError {
    FetchError::EntityMismatch {
        expected,
        actual: collection.entity(),
    }
}

impl Record for Order {
    const ENTITY: Entity = Entity::Orders;
    const SINGULAR: &'static str = "Order";
    const PLURAL: &'static str = "Orders";
    const EXCHANGE_SYNC: bool = true;

    fn key(&self) -> &str {
        &self.utid
    }

    fn from_collection(collection: Collection) -> Result<Vec<Self>, FetchError> {
        match collection {
            Collection::Orders(items) => Ok(items),
            other => Err(mismatch(Self::ENTITY, &other)),
        }
    }

    fn default_sorting() -> Sorting {
        Sorting::by("creation_time", SortingOrder::Asc)
    }
}

impl Record for Transaction {
    const ENTITY: Entity = Entity::Transactions;
    const SINGULAR: &'static str = "Transaction";
    const PLURAL: &'static str = "Transactions";

    fn key(&self) -> &str {
        &self.utid
    }

    fn from_collection(collection: Collection) -> Result<Vec<Self>, FetchError> {
        match collection {
            Collection::Transactions(items) => Ok(items),
            other => Err(mismatch(Self::ENTITY, &other)),
        }
    }

    fn default_sorting() -> Sorting {
        Sorting::by("creation_time", SortingOrder::Asc)
    }
}

impl Record for Transfer {
    const ENTITY: Entity = Entity::Transfers;
    const SINGULAR: &'static str = "Transfer";
    const PLURAL: &'static str = "Transfers";

    fn key(&self) -> &str {
        &self.id
    }

    fn from_collection(collection: Collection) -> Result<Vec<Self>, FetchError> {
        match collection {
            Collection::Transfers(items) => Ok(items),
            other => Err(mismatch(Self::ENTITY, &other)),
        }
    }

    fn default_sorting() -> Sorting {
        Sorting::by("CreatedTimestamp", SortingOrder::Asc)
    }
}

impl Record for MarketAsset {
    const ENTITY: Entity = Entity::Markets;
    const SINGULAR: &'static str = "Asset";
    const PLURAL: &'static str = "Assets";
    const PLACEMENT: Placement = Placement::Back;

    fn key(&self) -> &str {
        &self.pair
    }

    /// Only the price moves; the label is kept
    fn absorb(&mut self, incoming: Self) {
        self.last_price = incoming.last_price;
    }

    fn from_collection(collection: Collection) -> Result<Vec<Self>, FetchError> {
        match collection {
            Collection::Markets(items) => Ok(items),
            other => Err(mismatch(Self::ENTITY, &other)),
        }
    }

    fn default_sorting() -> Sorting {
        Sorting::by("pair", SortingOrder::Asc)
    }

    fn default_filters() -> ListFilters {
        ListFilters {
            is_active: None,
            search: Some(String::new()),
        }
    }
}

// =============================================================================
// State, mutations, actions
// =============================================================================

/// State of a collection store
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState<T> {
    /// Records in display order
    pub items: Vec<T>,
    /// A load is in flight
    pub loading: bool,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
        }
    }
}

/// Synchronous transitions of a collection store
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionMutation<T> {
    /// Replace the whole collection
    SetItems(Vec<T>),
    /// Set the loading flag
    SetLoading(bool),
    /// Upsert by key
    Add(T),
    /// Replace by key, no-op when absent
    Update(T),
    /// Delete by key, no-op when absent
    Remove(String),
}

/// Asynchronous operations of a collection store
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionAction<T> {
    /// Fetch the whole collection
    Load,
    /// Pull orders from the exchanges, then fetch the collection
    SyncExchange,
    /// Upsert by key
    Add(T),
    /// Replace by key
    Update(T),
    /// Delete by key
    Remove(String),
}

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, OperationError> {
    serde_json::from_value(payload).map_err(|e| OperationError::InvalidPayload(e.to_string()))
}

/// Remove accepts either a bare key or the record itself
fn decode_key<T: Record>(payload: Value) -> Result<String, OperationError> {
    match payload {
        Value::String(key) => Ok(key),
        other => decode::<T>(other).map(|record| record.key().to_string()),
    }
}

impl<T: Record> Operation for CollectionMutation<T> {
    fn name(&self) -> String {
        match self {
            CollectionMutation::SetItems(_) => format!("set{}", T::PLURAL),
            CollectionMutation::SetLoading(_) => "setLoading".to_string(),
            CollectionMutation::Add(_) => format!("add{}", T::SINGULAR),
            CollectionMutation::Update(_) => format!("update{}", T::SINGULAR),
            CollectionMutation::Remove(_) => format!("remove{}", T::SINGULAR),
        }
    }

    fn from_named(name: &str, payload: Value) -> Result<Self, OperationError> {
        if name == "setLoading" {
            return decode(payload).map(CollectionMutation::SetLoading);
        }
        if let Some(plural) = name.strip_prefix("set") {
            if plural == T::PLURAL {
                return decode(payload).map(CollectionMutation::SetItems);
            }
        }

        match split_singular::<T>(name) {
            Some("add") => decode(payload).map(CollectionMutation::Add),
            Some("update") => decode(payload).map(CollectionMutation::Update),
            Some("remove") => decode_key::<T>(payload).map(CollectionMutation::Remove),
            _ => Err(OperationError::Unknown),
        }
    }
}

impl<T: Record> Operation for CollectionAction<T> {
    fn name(&self) -> String {
        match self {
            CollectionAction::Load => "load".to_string(),
            CollectionAction::SyncExchange => "syncExchange".to_string(),
            CollectionAction::Add(_) => format!("add{}", T::SINGULAR),
            CollectionAction::Update(_) => format!("update{}", T::SINGULAR),
            CollectionAction::Remove(_) => format!("remove{}", T::SINGULAR),
        }
    }

    fn from_named(name: &str, payload: Value) -> Result<Self, OperationError> {
        if name == "load" {
            return Ok(CollectionAction::Load);
        }
        if name == "syncExchange" && T::EXCHANGE_SYNC {
            return Ok(CollectionAction::SyncExchange);
        }

        match split_singular::<T>(name) {
            Some("add") => decode(payload).map(CollectionAction::Add),
            Some("update") => decode(payload).map(CollectionAction::Update),
            Some("remove") => decode_key::<T>(payload).map(CollectionAction::Remove),
            _ => Err(OperationError::Unknown),
        }
    }
}

/// `"addOrder"` → `Some("add")` for `Order`
fn split_singular<T: Record>(name: &str) -> Option<&str> {
    name.strip_suffix(T::SINGULAR)
        .filter(|verb| matches!(*verb, "add" | "update" | "remove"))
}

// =============================================================================
// Definition
// =============================================================================

/// Store definition shared by the four entity stores
pub struct CollectionDefinition<T> {
    fetcher: Arc<dyn FetchPort>,
    generation: RequestGeneration,
    last_error: Mutex<Option<FetchError>>,
    _record: PhantomData<fn() -> T>,
}

/// How a refresh reaches the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refresh {
    Load,
    SyncExchange,
}

impl<T: Record> CollectionDefinition<T> {
    /// Definition loading through `fetcher`
    pub fn new(fetcher: Arc<dyn FetchPort>) -> Self {
        Self {
            fetcher,
            generation: RequestGeneration::new(),
            last_error: Mutex::new(None),
            _record: PhantomData,
        }
    }

    /// Error of the most recent load that got to commit, if it failed
    pub fn last_error(&self) -> Option<FetchError> {
        self.last_error.lock().clone()
    }

    async fn fetch(&self, refresh: Refresh) -> Result<Vec<T>, FetchError> {
        if refresh == Refresh::SyncExchange {
            let synced = self.fetcher.sync_exchange().await?;
            info!(store = T::ENTITY.as_str(), synced, "Exchange orders synced");
        }
        self.fetcher.fetch_all(T::ENTITY).await.and_then(T::from_collection)
    }

    async fn refresh(&self, store: &Store<Self>, refresh: Refresh) -> StoreResult<()> {
        let ticket = self.generation.issue();
        store.commit(CollectionMutation::SetLoading(true));

        let result = self.fetch(refresh).await;

        if !self.generation.is_current(ticket) {
            warn!(
                store = store.id(),
                generation = ticket,
                latest = self.generation.latest(),
                "Discarding stale load response"
            );
            return Ok(());
        }

        match result {
            Ok(items) => {
                info!(store = store.id(), count = items.len(), generation = ticket, "Collection loaded");
                *self.last_error.lock() = None;
                store.commit(CollectionMutation::SetItems(items));
            },
            Err(e) => {
                error!(store = store.id(), error = %e, ?refresh, "Error loading collection");
                *self.last_error.lock() = Some(e);
            },
        }

        store.commit(CollectionMutation::SetLoading(false));
        Ok(())
    }
}

#[async_trait]
impl<T: Record> StoreDefinition for CollectionDefinition<T> {
    type State = CollectionState<T>;
    type Mutation = CollectionMutation<T>;
    type Action = CollectionAction<T>;

    fn id(&self) -> &'static str {
        T::ENTITY.as_str()
    }

    fn state(&self) -> Self::State {
        CollectionState::default()
    }

    fn mutate(&self, state: &mut Self::State, mutation: Self::Mutation) {
        match mutation {
            CollectionMutation::SetItems(items) => state.items = items,
            CollectionMutation::SetLoading(loading) => state.loading = loading,
            CollectionMutation::Add(record) => {
                match state.items.iter_mut().find(|r| r.key() == record.key()) {
                    Some(existing) => existing.absorb(record),
                    None => match T::PLACEMENT {
                        Placement::Front => state.items.insert(0, record),
                        Placement::Back => state.items.push(record),
                    },
                }
            },
            CollectionMutation::Update(record) => {
                if let Some(existing) = state.items.iter_mut().find(|r| r.key() == record.key()) {
                    *existing = record;
                }
            },
            CollectionMutation::Remove(key) => {
                if let Some(index) = state.items.iter().position(|r| r.key() == key) {
                    state.items.remove(index);
                }
            },
        }
    }

    async fn act(&self, store: &Store<Self>, action: Self::Action) -> StoreResult<()> {
        match action {
            CollectionAction::Load => self.refresh(store, Refresh::Load).await,
            CollectionAction::SyncExchange if T::EXCHANGE_SYNC => {
                self.refresh(store, Refresh::SyncExchange).await
            },
            CollectionAction::SyncExchange => {
                Err(StoreError::unknown_action(store.id(), "syncExchange"))
            },
            CollectionAction::Add(record) => {
                store.commit(CollectionMutation::Add(record));
                Ok(())
            },
            CollectionAction::Update(record) => {
                store.commit(CollectionMutation::Update(record));
                Ok(())
            },
            CollectionAction::Remove(key) => {
                store.commit(CollectionMutation::Remove(key));
                Ok(())
            },
        }
    }
}

// =============================================================================
// Entity stores and getters
// =============================================================================

/// Store of a single entity collection
pub type CollectionStore<T> = Store<CollectionDefinition<T>>;
/// Orders store
pub type OrdersStore = CollectionStore<Order>;
/// Transactions store
pub type TransactionsStore = CollectionStore<Transaction>;
/// Transfers store
pub type TransfersStore = CollectionStore<Transfer>;
/// Market assets store
pub type MarketsStore = CollectionStore<MarketAsset>;

impl<T: Record> Store<CollectionDefinition<T>> {
    /// Entity store loading through `fetcher`
    pub fn with_fetcher(fetcher: Arc<dyn FetchPort>) -> Self {
        Store::new(CollectionDefinition::new(fetcher))
    }

    /// Every record, in store order
    pub fn all(&self) -> Vec<T> {
        self.read(|s| s.items.clone())
    }

    /// Records whose active flag is set
    pub fn active(&self) -> Vec<T> {
        self.read(|s| s.items.iter().filter(|r| r.is_active()).cloned().collect())
    }

    /// Records whose active flag is clear
    pub fn completed(&self) -> Vec<T> {
        self.read(|s| s.items.iter().filter(|r| !r.is_active()).cloned().collect())
    }

    /// Record with `key`
    pub fn find(&self, key: &str) -> Option<T> {
        self.read(|s| s.items.iter().find(|r| r.key() == key).cloned())
    }

    /// A load is in flight
    pub fn is_loading(&self) -> bool {
        self.read(|s| s.loading)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.read(|s| s.items.len())
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run a list query over the current snapshot
    pub fn query(&self, params: &ListParams) -> StoreResult<Page<T>> {
        let snapshot = self.state();
        Ok(query(&snapshot.items, params)?)
    }

    /// Dispatch `load`
    pub async fn load(&self) -> StoreResult<()> {
        self.dispatch(CollectionAction::Load).await
    }

    /// Failure of the latest committed load, cleared by the next success
    pub fn last_load_error(&self) -> Option<FetchError> {
        self.definition().last_error()
    }
}

impl Store<CollectionDefinition<Order>> {
    /// Dispatch `syncExchange`
    pub async fn sync_exchange(&self) -> StoreResult<()> {
        self.dispatch(CollectionAction::SyncExchange).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubFetcher;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use xahod_domain::{TradeStatus, TradeType, TransferStatus};

    fn order(utid: &str) -> Order {
        Order::new(utid, TradeType::Buy, TradeStatus::Open, "2024-01-01T00:00:00Z")
    }

    fn orders_store() -> OrdersStore {
        OrdersStore::with_fetcher(Arc::new(StubFetcher::new()))
    }

    #[test]
    fn test_mutation_names() {
        assert_eq!(CollectionMutation::<Order>::SetItems(vec![]).name(), "setOrders");
        assert_eq!(CollectionMutation::<Order>::SetLoading(true).name(), "setLoading");
        assert_eq!(CollectionMutation::Add(order("A")).name(), "addOrder");
        assert_eq!(CollectionMutation::<Transfer>::Remove("x".into()).name(), "removeTransfer");
        assert_eq!(CollectionMutation::<MarketAsset>::SetItems(vec![]).name(), "setAssets");
        assert_eq!(CollectionAction::<Transaction>::Load.name(), "load");
    }

    #[test]
    fn test_from_named_resolves_entity_names_only() {
        let ok = CollectionMutation::<Order>::from_named("removeOrder", json!("A"));
        assert_eq!(ok, Ok(CollectionMutation::Remove("A".to_string())));

        let wrong_entity = CollectionMutation::<Order>::from_named("removeTransfer", json!("A"));
        assert_eq!(wrong_entity, Err(OperationError::Unknown));

        let bad = CollectionMutation::<Order>::from_named("setLoading", json!("yes"));
        assert!(matches!(bad, Err(OperationError::InvalidPayload(_))));

        assert_eq!(
            CollectionAction::<MarketAsset>::from_named("load", Value::Null),
            Ok(CollectionAction::Load)
        );
        assert_eq!(
            CollectionAction::<MarketAsset>::from_named("reload", Value::Null),
            Err(OperationError::Unknown)
        );
    }

    #[test]
    fn test_remove_accepts_record_payload() {
        let payload = serde_json::to_value(order("B")).unwrap();
        let parsed = CollectionAction::<Order>::from_named("removeOrder", payload);
        assert_eq!(parsed, Ok(CollectionAction::Remove("B".to_string())));
    }

    #[test]
    fn test_add_prepends_and_upserts() {
        let store = orders_store();

        store.commit(CollectionMutation::Add(order("A")));
        store.commit(CollectionMutation::Add(order("B")));

        let mut replacement = order("A");
        replacement.price = dec!(1.25);
        store.commit(CollectionMutation::Add(replacement));

        let keys: Vec<String> = store.all().into_iter().map(|o| o.utid).collect();
        assert_eq!(keys, vec!["B", "A"]);
        assert_eq!(store.find("A").unwrap().price, dec!(1.25));
    }

    #[test]
    fn test_market_add_appends_and_keeps_label() {
        let store = MarketsStore::with_fetcher(Arc::new(StubFetcher::new()));

        let mut labelled = MarketAsset::new("XRP/USDT", Some(dec!(0.5)));
        labelled.display_name = "Ripple".to_string();
        store.commit(CollectionMutation::Add(labelled));
        store.commit(CollectionMutation::Add(MarketAsset::new("XAH/USDT", None)));
        store.commit(CollectionMutation::Add(MarketAsset::new("XRP/USDT", Some(dec!(0.6)))));

        let all = store.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].pair, "XRP/USDT");
        assert_eq!(all[0].display_name, "Ripple");
        assert_eq!(all[0].last_price, Some(dec!(0.6)));
        assert_eq!(all[1].pair, "XAH/USDT");
    }

    #[test]
    fn test_update_and_remove_missing_are_noops() {
        let store = orders_store();
        store.commit(CollectionMutation::Add(order("A")));
        let before = store.state();

        store.commit(CollectionMutation::Update(order("Z")));
        store.commit(CollectionMutation::Remove("Z".to_string()));

        assert_eq!(store.state().items, before.items);
    }

    #[test]
    fn test_active_and_completed_getters() {
        let store = TransfersStore::with_fetcher(Arc::new(StubFetcher::new()));
        store.commit(CollectionMutation::SetItems(vec![
            Transfer::new("1", TransferStatus::Complete, "2024-01-01"),
            Transfer::new("2", TransferStatus::Rejected, "2024-01-02"),
            Transfer::new("3", TransferStatus::Created, "2024-01-03"),
        ]));

        assert_eq!(store.active().len(), 2);
        assert_eq!(store.completed().len(), 1);
        assert_eq!(store.completed()[0].id, "1");
        assert_eq!(store.len(), 3);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_sync_exchange_only_on_orders() {
        assert_eq!(
            CollectionAction::<Order>::from_named("syncExchange", Value::Null),
            Ok(CollectionAction::SyncExchange)
        );
        assert_eq!(CollectionAction::<Order>::SyncExchange.name(), "syncExchange");
        assert_eq!(
            CollectionAction::<Transfer>::from_named("syncExchange", Value::Null),
            Err(OperationError::Unknown)
        );
    }

    #[tokio::test]
    async fn test_sync_exchange_action_rejected_off_orders() {
        let store = TransfersStore::with_fetcher(Arc::new(StubFetcher::new()));

        let err = store.dispatch(CollectionAction::SyncExchange).await.unwrap_err();

        assert!(matches!(err, StoreError::UnknownAction { .. }));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_last_load_error_tracks_latest_load() {
        let stub = Arc::new(StubFetcher::with_sample_data());
        let store = OrdersStore::with_fetcher(stub.clone());

        stub.set_fail_next(true);
        store.load().await.unwrap();
        assert!(matches!(store.last_load_error(), Some(FetchError::Unavailable(_))));

        store.load().await.unwrap();
        assert_eq!(store.last_load_error(), None);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_from_collection_rejects_other_entity() {
        let err = Order::from_collection(Collection::Markets(vec![])).unwrap_err();
        assert_eq!(
            err,
            FetchError::EntityMismatch {
                expected: Entity::Orders,
                actual: Entity::Markets,
            }
        );
    }
}
