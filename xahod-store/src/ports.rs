//! Fetch collaborator port
//!
//! The store layer never talks HTTP. Entity stores pull whole collections
//! through `FetchPort`; adapters (`DataApiClient`, `StubFetcher`) implement it.

use async_trait::async_trait;
use xahod_domain::{Entity, MarketAsset, Order, Transaction, Transfer};

use crate::error::FetchError;

/// Whole collection of one entity kind
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    /// All orders
    Orders(Vec<Order>),
    /// All transactions
    Transactions(Vec<Transaction>),
    /// All transfers
    Transfers(Vec<Transfer>),
    /// All market assets
    Markets(Vec<MarketAsset>),
}

impl Collection {
    /// Entity this collection holds
    pub fn entity(&self) -> Entity {
        match self {
            Collection::Orders(_) => Entity::Orders,
            Collection::Transactions(_) => Entity::Transactions,
            Collection::Transfers(_) => Entity::Transfers,
            Collection::Markets(_) => Entity::Markets,
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        match self {
            Collection::Orders(items) => items.len(),
            Collection::Transactions(items) => items.len(),
            Collection::Transfers(items) => items.len(),
            Collection::Markets(items) => items.len(),
        }
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty collection of `entity`
    pub fn empty(entity: Entity) -> Self {
        match entity {
            Entity::Orders => Collection::Orders(Vec::new()),
            Entity::Transactions => Collection::Transactions(Vec::new()),
            Entity::Transfers => Collection::Transfers(Vec::new()),
            Entity::Markets => Collection::Markets(Vec::new()),
        }
    }
}

/// Port for retrieving full entity collections.
///
/// Implementations:
/// - `StubFetcher` - In-memory collections for tests and development
/// - `DataApiClient` - Paging HTTP client (xahod-connectors)
#[async_trait]
pub trait FetchPort: Send + Sync {
    /// Fetch every record of `entity`.
    ///
    /// Implementations follow paging cursors themselves; callers always get
    /// the complete collection or an error.
    async fn fetch_all(&self, entity: Entity) -> Result<Collection, FetchError>;

    /// Check the collaborator is reachable
    async fn health_check(&self) -> Result<(), FetchError> {
        Ok(())
    }

    /// Ask the collaborator to pull orders from the exchanges.
    ///
    /// Returns the number of orders the exchange reported. Collaborators
    /// without an exchange link answer `Unavailable`.
    async fn sync_exchange(&self) -> Result<usize, FetchError> {
        Err(FetchError::Unavailable("exchange sync not supported".to_string()))
    }
}
