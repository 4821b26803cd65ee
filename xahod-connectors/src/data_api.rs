//! Data API REST Client
//!
//! Provides REST integration for:
//! - Paging through entity collections (`/data-api/rest/{Order|Transaction|Transfer}`)
//! - Reading the market snapshot (`/api/market`)
//! - Triggering the exchange order sync (`/api/exchange?action=sync_exchange`)
//!
//! # Paging
//!
//! Collection endpoints answer `{ "value": [...], "nextLink": "..." }`.
//! `nextLink` may be absolute and may lack the `/data-api` prefix; it is
//! reduced to path + query and re-prefixed before the next request. Paging
//! stops when `nextLink` is absent.

use async_trait::async_trait;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

use xahod_domain::{Entity, MarketAsset, Order, Transaction, Transfer};
use xahod_store::{Collection, FetchError, FetchPort};

// =============================================================================
// Constants
// =============================================================================

/// Request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Prefix every collection path must carry
const DATA_API_PREFIX: &str = "/data-api";

/// Orders collection endpoint
const ORDER_PATH: &str = "/data-api/rest/Order";

/// Transactions collection endpoint
const TRANSACTION_PATH: &str = "/data-api/rest/Transaction";

/// Transfers collection endpoint
const TRANSFER_PATH: &str = "/data-api/rest/Transfer";

/// Market snapshot endpoint
const MARKET_PATH: &str = "/api/market";

/// Exchange order sync endpoint
const EXCHANGE_SYNC_PATH: &str = "/api/exchange?action=sync_exchange";

/// Maximum error body kept in `Status` errors
const MAX_ERROR_BODY: usize = 512;

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur in the data API client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// API answered with a non-success status
    #[error("Data API error: HTTP {status} - {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// `nextLink` pointed at a page already requested
    #[error("Paging cursor loops back to {0}")]
    CursorLoop(String),
}

impl From<DataApiError> for FetchError {
    fn from(err: DataApiError) -> Self {
        match err {
            DataApiError::RequestFailed(msg) => FetchError::Request(msg),
            DataApiError::Status { status, body } => FetchError::Status { status, body },
            DataApiError::ParseError(msg) => FetchError::Decode(msg),
            DataApiError::Timeout => FetchError::Timeout,
            DataApiError::CursorLoop(link) => {
                FetchError::Decode(format!("paging cursor loops back to {}", link))
            },
        }
    }
}

// =============================================================================
// Wire types
// =============================================================================

/// One page of a collection endpoint
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct DataApiPage<T> {
    /// Records on this page
    #[serde(default)]
    pub value: Vec<T>,
    /// Link to the next page, absent on the last one
    #[serde(rename = "nextLink", default)]
    pub next_link: Option<String>,
}

/// One ticker entry of the market snapshot
#[derive(Debug, Deserialize)]
pub struct MarketTick {
    /// Pair symbol
    pub symbol: String,
    /// Last traded price
    #[serde(default)]
    pub last: Option<Decimal>,
}

// =============================================================================
// Data API Client
// =============================================================================

/// Data API client.
pub struct DataApiClient {
    /// HTTP client
    client: Client,
    /// Base URL without trailing slash
    base_url: String,
    /// Bearer token sent on every request
    auth_token: Option<String>,
    /// Per-request timeout
    timeout: Duration,
}

impl DataApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:4280`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            auth_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Send `Authorization: Bearer <token>` on every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a GET request for `path` and return the body.
    async fn get(&self, path: &str) -> Result<String, DataApiError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        // the deadline covers headers and body
        let exchange = async {
            let response =
                request.send().await.map_err(|e| DataApiError::RequestFailed(e.to_string()))?;
            let status = response.status();
            let body =
                response.text().await.map_err(|e| DataApiError::ParseError(e.to_string()))?;
            Ok::<_, DataApiError>((status, body))
        };
        let (status, body) =
            timeout(self.timeout, exchange).await.map_err(|_| DataApiError::Timeout)??;

        if !status.is_success() {
            let mut body = body;
            body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
            return Err(DataApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    /// Follow `nextLink` from `start` until the last page.
    pub async fn fetch_paged<T: DeserializeOwned>(&self, start: &str) -> Result<Vec<T>, DataApiError> {
        let mut records = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(start.to_string());

        while let Some(path) = next.take() {
            if !visited.insert(path.clone()) {
                warn!(link = %path, "Data API cursor loop detected");
                return Err(DataApiError::CursorLoop(path));
            }

            debug!(link = %path, "Fetching data API page");
            let body = self.get(&path).await?;
            let page: DataApiPage<T> =
                serde_json::from_str(&body).map_err(|e| DataApiError::ParseError(e.to_string()))?;

            records.extend(page.value);
            next = page.next_link.as_deref().map(normalize_next_link);
        }

        Ok(records)
    }

    /// Fetch every order.
    pub async fn fetch_orders(&self) -> Result<Vec<Order>, DataApiError> {
        self.fetch_paged(ORDER_PATH).await
    }

    /// Fetch every transaction.
    pub async fn fetch_transactions(&self) -> Result<Vec<Transaction>, DataApiError> {
        self.fetch_paged(TRANSACTION_PATH).await
    }

    /// Fetch every transfer.
    pub async fn fetch_transfers(&self) -> Result<Vec<Transfer>, DataApiError> {
        self.fetch_paged(TRANSFER_PATH).await
    }

    /// Fetch the market snapshot as assets, one per pair.
    pub async fn fetch_market(&self) -> Result<Vec<MarketAsset>, DataApiError> {
        let body = self.get(MARKET_PATH).await?;
        parse_market_snapshot(&body)
    }

    /// Ask the backend to pull orders from the exchanges.
    ///
    /// Returns how many orders the backend reported; a non-array answer
    /// counts as none.
    pub async fn sync_exchange_orders(&self) -> Result<usize, DataApiError> {
        let body = self.get(EXCHANGE_SYNC_PATH).await?;
        let reply: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| DataApiError::ParseError(e.to_string()))?;

        let count = reply.as_array().map(Vec::len).unwrap_or(0);
        debug!(count, "Exchange orders synced");
        Ok(count)
    }
}

#[async_trait]
impl FetchPort for DataApiClient {
    async fn fetch_all(&self, entity: Entity) -> Result<Collection, FetchError> {
        let collection = match entity {
            Entity::Orders => Collection::Orders(self.fetch_orders().await?),
            Entity::Transactions => Collection::Transactions(self.fetch_transactions().await?),
            Entity::Transfers => Collection::Transfers(self.fetch_transfers().await?),
            Entity::Markets => Collection::Markets(self.fetch_market().await?),
        };

        debug!(entity = %entity, count = collection.len(), "Data API collection fetched");
        Ok(collection)
    }

    async fn health_check(&self) -> Result<(), FetchError> {
        self.get(MARKET_PATH).await?;
        Ok(())
    }

    async fn sync_exchange(&self) -> Result<usize, FetchError> {
        Ok(self.sync_exchange_orders().await?)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Reduce a `nextLink` to path + query under `/data-api`.
pub fn normalize_next_link(link: &str) -> String {
    let path = match Url::parse(link) {
        Ok(url) => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        },
        // already relative
        Err(_) if link.starts_with('/') => link.to_string(),
        Err(_) => format!("/{}", link),
    };

    if path.starts_with(DATA_API_PREFIX) {
        path
    } else {
        format!("{}{}", DATA_API_PREFIX, path)
    }
}

/// Map the market snapshot object into assets, deduplicated by pair.
///
/// The snapshot is an object keyed by exchange-specific ids; each value
/// carries `symbol` and `last`. Assets keep document order (`serde_json` is
/// built with `preserve_order`). A later entry for the same pair only
/// updates its price.
pub fn parse_market_snapshot(body: &str) -> Result<Vec<MarketAsset>, DataApiError> {
    let snapshot: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(body).map_err(|e| DataApiError::ParseError(e.to_string()))?;

    let mut assets: Vec<MarketAsset> = Vec::new();
    for (key, value) in snapshot {
        let tick: MarketTick = serde_json::from_value(value)
            .map_err(|e| DataApiError::ParseError(format!("market entry {}: {}", key, e)))?;

        match assets.iter_mut().find(|a| a.pair == tick.symbol) {
            Some(existing) => existing.last_price = tick.last,
            None => assets.push(MarketAsset::new(tick.symbol, tick.last)),
        }
    }

    Ok(assets)
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_absolute_link_without_prefix() {
        let link = "https://example.org/rest/Order?$after=W3sib3JkZXIiOjF9XQ==";
        assert_eq!(
            normalize_next_link(link),
            "/data-api/rest/Order?$after=W3sib3JkZXIiOjF9XQ=="
        );
    }

    #[test]
    fn test_normalize_keeps_existing_prefix() {
        assert_eq!(
            normalize_next_link("http://localhost:4280/data-api/rest/Transfer?page=2"),
            "/data-api/rest/Transfer?page=2"
        );
        assert_eq!(
            normalize_next_link("/data-api/rest/Transaction"),
            "/data-api/rest/Transaction"
        );
        assert_eq!(normalize_next_link("rest/Order"), "/data-api/rest/Order");
    }

    #[test]
    fn test_parse_market_snapshot_dedupes_pairs() {
        let body = r#"{
            "a": {"symbol": "XRP/USDT", "last": "0.52"},
            "b": {"symbol": "XAH/USDT", "last": 0.21},
            "c": {"symbol": "XRP/USDT", "last": "0.55"},
            "d": {"symbol": "XAH/XRP", "last": null}
        }"#;

        let assets = parse_market_snapshot(body).unwrap();

        assert_eq!(assets.len(), 3);
        assert_eq!(assets[0].pair, "XRP/USDT");
        assert_eq!(assets[0].display_name, "XRP/USDT");
        assert_eq!(assets[0].last_price, Some(dec!(0.55)));
        assert_eq!(assets[1].last_price, Some(dec!(0.21)));
        assert_eq!(assets[2].last_price, None);
    }

    #[test]
    fn test_parse_market_snapshot_keeps_document_order() {
        let body = r#"{
            "zz": {"symbol": "XAH/XRP", "last": "0.4"},
            "aa": {"symbol": "XRP/USDT", "last": "0.52"},
            "mm": {"symbol": "BTC/USDT", "last": null}
        }"#;

        let pairs: Vec<String> =
            parse_market_snapshot(body).unwrap().into_iter().map(|a| a.pair).collect();

        assert_eq!(pairs, vec!["XAH/XRP", "XRP/USDT", "BTC/USDT"]);
    }

    #[test]
    fn test_parse_market_snapshot_rejects_non_object() {
        assert!(matches!(
            parse_market_snapshot("[1, 2]"),
            Err(DataApiError::ParseError(_))
        ));
    }

    #[test]
    fn test_page_without_next_link() {
        let page: DataApiPage<serde_json::Value> =
            serde_json::from_str(r#"{"value": [{"id": 1}]}"#).unwrap();
        assert_eq!(page.value.len(), 1);
        assert!(page.next_link.is_none());
    }

    #[test]
    fn test_error_conversion() {
        assert_eq!(FetchError::from(DataApiError::Timeout), FetchError::Timeout);
        assert!(matches!(
            FetchError::from(DataApiError::CursorLoop("/x".into())),
            FetchError::Decode(_)
        ));
        assert_eq!(
            FetchError::from(DataApiError::Status {
                status: 401,
                body: "no".into()
            }),
            FetchError::Status {
                status: 401,
                body: "no".into()
            }
        );
    }

    #[test]
    fn test_client_builder() {
        let client = DataApiClient::new("http://localhost:4280/")
            .with_auth_token("token")
            .with_timeout(Duration::from_secs(2));

        assert_eq!(client.base_url(), "http://localhost:4280");
        assert_eq!(client.timeout, Duration::from_secs(2));
    }
}
