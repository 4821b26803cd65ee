//! Field tables for the dashboard records

use xahod_domain::{MarketAsset, Order, Transaction, Transfer};

use crate::field::{FieldKind, FieldSpec, FieldValue, Queryable};

use FieldKind::{Flag, Number, Text, Timestamp};

// =============================================================================
// Order
// =============================================================================

impl Queryable for Order {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("utid", Text, false),
        FieldSpec::new("trade_id", Text, false),
        FieldSpec::new("trade_type", Text, true),
        FieldSpec::new("status", Text, false),
        FieldSpec::new("creation_time", Timestamp, true),
        FieldSpec::new("currency", Text, false),
        FieldSpec::new("currency_pair", Text, true),
        FieldSpec::new("price", Number, true),
        FieldSpec::new("quantity", Number, true),
        FieldSpec::new("commission", Number, false),
        FieldSpec::new("platform", Text, true),
        FieldSpec::new("automated", Flag, true),
        FieldSpec::new("notes", Text, false),
    ];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "utid" => FieldValue::Text(&self.utid),
            "trade_id" => FieldValue::Text(&self.trade_id),
            "trade_type" => FieldValue::Text(self.trade_type.as_str()),
            "status" => FieldValue::Text(self.status.as_str()),
            "creation_time" => FieldValue::Text(&self.creation_time),
            "currency" => FieldValue::Text(&self.currency),
            "currency_pair" => FieldValue::Text(&self.currency_pair),
            "price" => FieldValue::Number(self.price),
            "quantity" => FieldValue::Number(self.quantity),
            "commission" => FieldValue::Number(self.commission),
            "platform" => FieldValue::Text(&self.platform),
            "automated" => FieldValue::Flag(self.automated),
            "notes" => FieldValue::Text(&self.notes),
            _ => return None,
        })
    }

    fn is_active(&self) -> bool {
        Order::is_active(self)
    }
}

// =============================================================================
// Transaction
// =============================================================================

impl Queryable for Transaction {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("utid", Text, true),
        FieldSpec::new("status", Text, true),
        FieldSpec::new("raddress", Text, true),
        FieldSpec::new("amount_xrp", Number, true),
        FieldSpec::new("amount_xah", Number, true),
        FieldSpec::new("given_rate", Number, true),
        FieldSpec::new("price_market_xrp", Number, false),
        FieldSpec::new("price_market_xah", Number, false),
        FieldSpec::new("tx_hash_xrp", Text, false),
        FieldSpec::new("tx_hash_xah", Text, false),
        FieldSpec::new("memo_data", Text, false),
        FieldSpec::new("creation_time", Timestamp, true),
        FieldSpec::new("notes", Text, false),
        FieldSpec::new("active", Flag, false),
    ];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "utid" => FieldValue::Text(&self.utid),
            "status" => FieldValue::Text(self.status.as_str()),
            "raddress" => FieldValue::Text(&self.raddress),
            "amount_xrp" => FieldValue::Number(self.amount_xrp),
            "amount_xah" => FieldValue::Number(self.amount_xah),
            "given_rate" => FieldValue::Number(self.given_rate),
            "price_market_xrp" => FieldValue::Number(self.price_market_xrp),
            "price_market_xah" => FieldValue::Number(self.price_market_xah),
            "tx_hash_xrp" => FieldValue::Text(&self.tx_hash_xrp),
            "tx_hash_xah" => FieldValue::Text(&self.tx_hash_xah),
            "memo_data" => FieldValue::Text(&self.memo_data),
            "creation_time" => FieldValue::Text(&self.creation_time),
            "notes" => FieldValue::Text(&self.notes),
            // derived, never the stored value
            "active" => FieldValue::Flag(Transaction::is_active(self)),
            _ => return None,
        })
    }

    fn is_active(&self) -> bool {
        Transaction::is_active(self)
    }

    fn refresh_derived(&mut self) {
        self.active = Transaction::is_active(self);
    }
}

// =============================================================================
// Transfer
// =============================================================================

impl Queryable for Transfer {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id", Text, true),
        FieldSpec::new("CreatedTimestamp", Timestamp, true),
        FieldSpec::new("CompletedTimestamp", Timestamp, false),
        FieldSpec::new("FromAccount", Text, true),
        FieldSpec::new("to_acc", Text, true),
        FieldSpec::new("amount", Number, true),
        FieldSpec::new("currency", Text, true),
        FieldSpec::new("payload", Text, false),
        FieldSpec::new("expires_by", Timestamp, false),
        FieldSpec::new("status", Text, false),
        FieldSpec::new("active", Flag, false),
        FieldSpec::new("LookupHash", Text, false),
    ];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Text(&self.id),
            "CreatedTimestamp" => FieldValue::Text(&self.created_timestamp),
            "CompletedTimestamp" => FieldValue::Text(&self.completed_timestamp),
            "FromAccount" => FieldValue::Text(&self.from_account),
            "to_acc" => FieldValue::Text(&self.to_acc),
            "amount" => FieldValue::Number(self.amount),
            "currency" => FieldValue::Text(&self.currency),
            "payload" => FieldValue::Text(&self.payload),
            "expires_by" => FieldValue::Text(&self.expires_by),
            "status" => FieldValue::Text(self.status.as_str()),
            "active" => FieldValue::Flag(Transfer::is_active(self)),
            "LookupHash" => FieldValue::Text(&self.lookup_hash),
            _ => return None,
        })
    }

    fn is_active(&self) -> bool {
        Transfer::is_active(self)
    }

    fn refresh_derived(&mut self) {
        self.active = Transfer::is_active(self);
    }
}

// =============================================================================
// Market Asset
// =============================================================================

impl Queryable for MarketAsset {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("displayName", Text, true),
        FieldSpec::new("pair", Text, true),
        FieldSpec::new("lastPrice", Number, false),
    ];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "displayName" => Some(FieldValue::Text(&self.display_name)),
            "pair" => Some(FieldValue::Text(&self.pair)),
            "lastPrice" => self.last_price.map(FieldValue::Number),
            _ => None,
        }
    }

    fn is_active(&self) -> bool {
        true
    }
}
