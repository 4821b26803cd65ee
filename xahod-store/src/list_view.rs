//! List view facade
//!
//! Per-screen state for a paged, filtered, sorted list. The view does not
//! own records; it asks a `PageSource` for one page at a time and keeps the
//! last good page.

use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error};
use xahod_domain::{ListFilters, ListParams, Pagination, Sorting, SortingOrder};
use xahod_query::Page;

use crate::collection::{CollectionStore, Record};
use crate::error::StoreResult;

/// Anything that can answer a list query with one page
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    /// Run `params` and return the matching page
    async fn fetch_page(&self, params: ListParams) -> StoreResult<Page<T>>;
}

#[async_trait]
impl<T: Record> PageSource<T> for CollectionStore<T> {
    async fn fetch_page(&self, params: ListParams) -> StoreResult<Page<T>> {
        self.query(&params)
    }
}

/// Observable list state
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    /// A fetch is in flight
    pub is_loading: bool,
    /// Records on the current page
    pub items: Vec<T>,
    /// Active filters
    pub filters: ListFilters,
    /// Active sorting
    pub sorting: Sorting,
    /// Current page, size and filtered total
    pub pagination: Pagination,
}

/// Initial values overriding the record's defaults
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Initial filters
    pub filters: Option<ListFilters>,
    /// Initial sorting
    pub sorting: Option<Sorting>,
    /// Initial pagination
    pub pagination: Option<Pagination>,
}

/// List facade over a page source
pub struct ListView<T, P> {
    source: Arc<P>,
    state: ListState<T>,
    _record: PhantomData<fn() -> T>,
}

impl<T, P> ListView<T, P>
where
    T: Record,
    P: PageSource<T>,
{
    /// View with the record's default filters and sorting
    pub fn new(source: Arc<P>) -> Self {
        Self::with_options(source, ListOptions::default())
    }

    /// View with explicit initial values
    pub fn with_options(source: Arc<P>, options: ListOptions) -> Self {
        Self {
            source,
            state: ListState {
                is_loading: false,
                items: Vec::new(),
                filters: options.filters.unwrap_or_else(T::default_filters),
                sorting: options.sorting.unwrap_or_else(T::default_sorting),
                pagination: options.pagination.unwrap_or_default(),
            },
            _record: PhantomData,
        }
    }

    /// Current state
    pub fn state(&self) -> &ListState<T> {
        &self.state
    }

    /// Records on the current page
    pub fn items(&self) -> &[T] {
        &self.state.items
    }

    /// Query parameters the next fetch will send
    pub fn params(&self) -> ListParams {
        ListParams::compose(&self.state.filters, &self.state.sorting, &self.state.pagination)
    }

    /// Fetch the page for the current filters, sorting and pagination.
    ///
    /// On failure the previous items and pagination are kept.
    pub async fn fetch(&mut self) -> StoreResult<()> {
        self.state.is_loading = true;
        let params = self.params();
        let result = self.source.fetch_page(params).await;
        self.state.is_loading = false;

        match result {
            Ok(page) => {
                debug!(
                    entity = %T::ENTITY,
                    count = page.data.len(),
                    total = page.pagination.total,
                    "List page fetched"
                );
                self.state.items = page.data;
                if self.state.sorting.sorting_order.is_none() {
                    self.state.sorting.sorting_order = Some(SortingOrder::Asc);
                }
                self.state.pagination = page.pagination;
                Ok(())
            },
            Err(e) => {
                error!(entity = %T::ENTITY, error = %e, "Error fetching list page");
                Err(e)
            },
        }
    }

    /// Change filters, go back to page 1 and fetch
    pub async fn update_filters(&mut self, f: impl FnOnce(&mut ListFilters)) -> StoreResult<()> {
        f(&mut self.state.filters);
        self.state.pagination.page = 1;
        self.fetch().await
    }

    /// Change sorting and fetch
    pub async fn update_sorting(&mut self, f: impl FnOnce(&mut Sorting)) -> StoreResult<()> {
        f(&mut self.state.sorting);
        self.fetch().await
    }

    /// Change page or page size and fetch
    pub async fn update_pagination(&mut self, f: impl FnOnce(&mut Pagination)) -> StoreResult<()> {
        f(&mut self.state.pagination);
        self.fetch().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CollectionMutation, MarketsStore, OrdersStore};
    use crate::error::StoreError;
    use crate::stub::StubFetcher;
    use xahod_domain::{MarketAsset, Order, TradeStatus, TradeType};

    fn closed_orders(n: usize) -> Arc<OrdersStore> {
        let store = OrdersStore::with_fetcher(Arc::new(StubFetcher::new()));
        let orders = (0..n)
            .map(|i| {
                Order::new(
                    format!("O{:02}", i),
                    TradeType::Sell,
                    TradeStatus::Closed,
                    format!("2024-01-{:02}T00:00:00Z", i + 1),
                )
            })
            .collect();
        store.commit(CollectionMutation::SetItems(orders));
        Arc::new(store)
    }

    fn orders_view(n: usize) -> ListView<Order, OrdersStore> {
        ListView::new(closed_orders(n))
    }

    #[test]
    fn test_record_defaults() {
        let orders = orders_view(0);
        assert_eq!(orders.state().sorting, Sorting::by("creation_time", SortingOrder::Asc));
        assert_eq!(orders.state().filters.is_active, Some(false));
        assert_eq!(orders.state().pagination, Pagination::default());

        let markets: ListView<MarketAsset, MarketsStore> = ListView::new(Arc::new(
            MarketsStore::with_fetcher(Arc::new(StubFetcher::new())),
        ));
        assert_eq!(markets.state().filters.is_active, None);
        assert_eq!(markets.state().sorting.sort_by.as_deref(), Some("pair"));
    }

    #[tokio::test]
    async fn test_update_filters_resets_page() {
        let mut view = orders_view(25);
        view.update_pagination(|p| p.page = 3).await.unwrap();
        assert_eq!(view.items().len(), 5);

        view.update_filters(|f| f.search = Some("2024-01-1".to_string())).await.unwrap();

        assert_eq!(view.state().pagination.page, 1);
        assert_eq!(view.state().pagination.total, 10);
    }

    #[tokio::test]
    async fn test_update_sorting_keeps_page() {
        let mut view = orders_view(25);
        view.update_pagination(|p| p.page = 2).await.unwrap();

        view.update_sorting(|s| s.sorting_order = Some(SortingOrder::Desc)).await.unwrap();

        assert_eq!(view.state().pagination.page, 2);
        assert_eq!(view.items()[0].utid, "O14");
    }

    #[tokio::test]
    async fn test_missing_order_normalized_after_fetch() {
        let mut view = orders_view(3);

        view.update_sorting(|s| s.sorting_order = None).await.unwrap();

        assert_eq!(view.state().sorting.sorting_order, Some(SortingOrder::Asc));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_page() {
        let mut view = orders_view(12);
        view.fetch().await.unwrap();
        let before = view.state().clone();

        let err = view.update_sorting(|s| s.sort_by = Some("nope".to_string())).await.unwrap_err();

        assert!(matches!(err, StoreError::Query(_)));
        assert_eq!(view.items(), before.items.as_slice());
        assert_eq!(view.state().pagination, before.pagination);
        assert!(!view.state().is_loading);
    }
}
