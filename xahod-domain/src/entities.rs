//! Domain Entities for the Xahod dashboard
//!
//! The four record kinds listed on the dashboard screens. Every record has a
//! stable key used for find/update/remove and a status drawn from a closed
//! enumeration. Field names follow the data API wire format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::value_objects::DomainError;

// =============================================================================
// Entity
// =============================================================================

/// Entity collections known to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    /// Exchange orders
    Orders,
    /// XRP/XAH swap transactions
    Transactions,
    /// Account-to-account transfers
    Transfers,
    /// Market assets (price tickers)
    Markets,
}

impl Entity {
    /// Every entity, in dashboard order.
    pub const ALL: [Entity; 4] =
        [Entity::Orders, Entity::Transactions, Entity::Transfers, Entity::Markets];

    /// Lowercase name used in logs and URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Orders => "orders",
            Entity::Transactions => "transactions",
            Entity::Transfers => "transfers",
            Entity::Markets => "markets",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// Trade status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    /// Resting on the exchange
    Open,
    /// Filled or cancelled
    Closed,
}

impl TradeStatus {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TradeStatus::Open),
            "closed" => Ok(TradeStatus::Closed),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl TradeType {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "buy",
            TradeType::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order placed on an exchange, keyed by `utid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique trade identifier (record key)
    pub utid: String,
    /// Exchange-side trade id
    #[serde(default)]
    pub trade_id: String,
    /// Buy or sell
    pub trade_type: TradeType,
    /// Open or closed
    pub status: TradeStatus,
    /// Creation time as sent by the data API (ISO-8601)
    pub creation_time: String,
    /// Settlement currency
    #[serde(default)]
    pub currency: String,
    /// Traded pair, e.g. `XRP/USDT`
    #[serde(default)]
    pub currency_pair: String,
    /// Limit price
    pub price: Decimal,
    /// Order size
    pub quantity: Decimal,
    /// Commission paid
    #[serde(default)]
    pub commission: Decimal,
    /// Exchange / venue name
    #[serde(default)]
    pub platform: String,
    /// Placed by the rebalancer rather than a human
    #[serde(default)]
    pub automated: bool,
    /// Free-form notes
    #[serde(default)]
    pub notes: String,
}

impl Order {
    /// Create an order with zeroed amounts and empty descriptive fields
    pub fn new(
        utid: impl Into<String>,
        trade_type: TradeType,
        status: TradeStatus,
        creation_time: impl Into<String>,
    ) -> Self {
        Self {
            utid: utid.into(),
            trade_id: String::new(),
            trade_type,
            status,
            creation_time: creation_time.into(),
            currency: String::new(),
            currency_pair: String::new(),
            price: Decimal::ZERO,
            quantity: Decimal::ZERO,
            commission: Decimal::ZERO,
            platform: String::new(),
            automated: false,
            notes: String::new(),
        }
    }

    /// An order is active while it is open
    pub fn is_active(&self) -> bool {
        self.status == TradeStatus::Open
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Lifecycle of a swap transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded, nothing sent yet
    Created,
    /// Being processed
    Processing,
    /// Payment issued
    Issued,
    /// Finished
    Complete,
    /// Waiting on a trade
    Trading,
    /// Awaiting an external step
    Pending,
    /// Terminal failure
    Failed,
}

impl TransactionStatus {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Created => "created",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Issued => "issued",
            TransactionStatus::Complete => "complete",
            TransactionStatus::Trading => "trading",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(TransactionStatus::Created),
            "processing" => Ok(TransactionStatus::Processing),
            "issued" => Ok(TransactionStatus::Issued),
            "complete" => Ok(TransactionStatus::Complete),
            "trading" => Ok(TransactionStatus::Trading),
            "pending" => Ok(TransactionStatus::Pending),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// XRP/XAH swap transaction, keyed by `utid`.
///
/// `active` is not authoritative: it is recomputed from `status` every time
/// the transaction goes through a list query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier (record key)
    pub utid: String,
    /// Lifecycle status
    pub status: TransactionStatus,
    /// Counterparty r-address
    #[serde(default)]
    pub raddress: String,
    /// XRP leg amount
    pub amount_xrp: Decimal,
    /// XAH leg amount
    pub amount_xah: Decimal,
    /// Rate quoted to the counterparty
    pub given_rate: Decimal,
    /// XRP market price at creation
    #[serde(default)]
    pub price_market_xrp: Decimal,
    /// XAH market price at creation
    #[serde(default)]
    pub price_market_xah: Decimal,
    /// XRP ledger transaction hash
    #[serde(default)]
    pub tx_hash_xrp: String,
    /// XAH ledger transaction hash
    #[serde(default)]
    pub tx_hash_xah: String,
    /// Memo attached to the payment
    #[serde(default)]
    pub memo_data: String,
    /// Creation time as sent by the data API (ISO-8601)
    pub creation_time: String,
    /// Free-form notes
    #[serde(default)]
    pub notes: String,
    /// Derived: anything not complete
    #[serde(default)]
    pub active: bool,
}

impl Transaction {
    /// Create a transaction with zeroed amounts and empty descriptive fields
    pub fn new(
        utid: impl Into<String>,
        status: TransactionStatus,
        creation_time: impl Into<String>,
    ) -> Self {
        Self {
            utid: utid.into(),
            status,
            raddress: String::new(),
            amount_xrp: Decimal::ZERO,
            amount_xah: Decimal::ZERO,
            given_rate: Decimal::ZERO,
            price_market_xrp: Decimal::ZERO,
            price_market_xah: Decimal::ZERO,
            tx_hash_xrp: String::new(),
            tx_hash_xah: String::new(),
            memo_data: String::new(),
            creation_time: creation_time.into(),
            notes: String::new(),
            active: status != TransactionStatus::Complete,
        }
    }

    /// Derived active flag (ignores the stored `active` field)
    pub fn is_active(&self) -> bool {
        self.status != TransactionStatus::Complete
    }
}

// =============================================================================
// Transfer
// =============================================================================

/// Lifecycle of a transfer between accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Recorded, nothing signed yet
    Created,
    /// Being processed
    Processing,
    /// Finished
    Complete,
    /// Waiting for a signature
    PendingSig,
    /// Submitted to the ledger
    Submitted,
    /// Rejected by a signer or the ledger
    Rejected,
    /// Signature window passed
    Expired,
}

impl TransferStatus {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Created => "created",
            TransferStatus::Processing => "processing",
            TransferStatus::Complete => "complete",
            TransferStatus::PendingSig => "pending_sig",
            TransferStatus::Submitted => "submitted",
            TransferStatus::Rejected => "rejected",
            TransferStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(TransferStatus::Created),
            "processing" => Ok(TransferStatus::Processing),
            "complete" => Ok(TransferStatus::Complete),
            "pending_sig" => Ok(TransferStatus::PendingSig),
            "submitted" => Ok(TransferStatus::Submitted),
            "rejected" => Ok(TransferStatus::Rejected),
            "expired" => Ok(TransferStatus::Expired),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Transfer between two accounts, keyed by `id`.
///
/// Field names mirror the data API, which mixes PascalCase and snake_case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    /// Transfer identifier (record key)
    pub id: String,
    /// When the transfer was created
    #[serde(rename = "CreatedTimestamp")]
    pub created_timestamp: String,
    /// When the transfer completed (empty while in flight)
    #[serde(rename = "CompletedTimestamp", default)]
    pub completed_timestamp: String,
    /// Source account
    #[serde(rename = "FromAccount")]
    pub from_account: String,
    /// Destination account
    pub to_acc: String,
    /// Amount moved
    pub amount: Decimal,
    /// Currency code
    pub currency: String,
    /// Signing payload reference
    #[serde(default)]
    pub payload: String,
    /// Signature deadline
    #[serde(default)]
    pub expires_by: String,
    /// Lifecycle status
    pub status: TransferStatus,
    /// Derived: anything not complete
    #[serde(default)]
    pub active: bool,
    /// Ledger lookup hash
    #[serde(rename = "LookupHash", default)]
    pub lookup_hash: String,
}

impl Transfer {
    /// Create a transfer with a zero amount and empty descriptive fields
    pub fn new(
        id: impl Into<String>,
        status: TransferStatus,
        created_timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            created_timestamp: created_timestamp.into(),
            completed_timestamp: String::new(),
            from_account: String::new(),
            to_acc: String::new(),
            amount: Decimal::ZERO,
            currency: String::new(),
            payload: String::new(),
            expires_by: String::new(),
            status,
            active: status != TransferStatus::Complete,
            lookup_hash: String::new(),
        }
    }

    /// Derived active flag (ignores the stored `active` field)
    pub fn is_active(&self) -> bool {
        self.status != TransferStatus::Complete
    }
}

// =============================================================================
// Market Asset
// =============================================================================

/// Ticker for a traded pair, keyed by `pair`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAsset {
    /// Label shown on the dashboard
    pub display_name: String,
    /// Pair symbol, e.g. `XRP/USDT` (record key)
    pub pair: String,
    /// Last traded price, unknown until the first snapshot
    #[serde(default)]
    pub last_price: Option<Decimal>,
}

impl MarketAsset {
    /// Create an asset whose display name is the pair itself
    pub fn new(pair: impl Into<String>, last_price: Option<Decimal>) -> Self {
        let pair = pair.into();
        Self {
            display_name: pair.clone(),
            pair,
            last_price,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
