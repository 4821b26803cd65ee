//! Field table and sort keys
//!
//! Records expose their fields by wire name. Each field carries a semantic
//! kind, which picks the comparator used when sorting by it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// Semantic kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Lexical comparison
    Text,
    /// Numeric comparison
    Number,
    /// Parsed instant comparison
    Timestamp,
    /// false < true
    Flag,
}

/// One entry in a record's field table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Wire name, as used by `sortBy`
    pub name: &'static str,
    /// Comparator kind
    pub kind: FieldKind,
    /// Covered by free-text search
    pub searchable: bool,
}

impl FieldSpec {
    /// Table entry
    pub const fn new(name: &'static str, kind: FieldKind, searchable: bool) -> Self {
        Self {
            name,
            kind,
            searchable,
        }
    }
}

/// Borrowed value of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Strings, enum wire names and timestamps
    Text(&'a str),
    /// Amounts and prices
    Number(Decimal),
    /// Booleans
    Flag(bool),
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(d) => write!(f, "{}", d),
            FieldValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

/// A record the query engine can filter, search, sort and page.
pub trait Queryable: Clone {
    /// Field table, one entry per sortable field
    const FIELDS: &'static [FieldSpec];

    /// Value of the field named `name`, `None` when absent
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;

    /// Derived active flag compared against the `isActive` filter
    fn is_active(&self) -> bool;

    /// Write derived fields back into the record before it is returned
    fn refresh_derived(&mut self) {}

    /// Table entry for `name`
    fn field_spec(name: &str) -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|spec| spec.name == name)
    }
}

/// Totally ordered key extracted from one field.
///
/// Within a single field every present value maps to the same variant, so
/// the derived ordering only ever compares like with like. `Missing` is the
/// lowest key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    /// Absent or unparseable
    Missing,
    /// Lexical
    Text(String),
    /// Numeric
    Number(Decimal),
    /// Parsed instant
    Instant(DateTime<Utc>),
    /// false < true
    Flag(bool),
}

impl SortKey {
    /// Build the key for `value` using the comparator of `kind`
    pub fn from_value(kind: FieldKind, value: Option<FieldValue<'_>>) -> Self {
        let Some(value) = value else {
            return SortKey::Missing;
        };

        match (kind, value) {
            (FieldKind::Number, FieldValue::Number(d)) => SortKey::Number(d),
            (FieldKind::Number, FieldValue::Text(s)) => s
                .trim()
                .parse::<Decimal>()
                .map(SortKey::Number)
                .unwrap_or(SortKey::Missing),
            (FieldKind::Timestamp, FieldValue::Text(s)) => {
                parse_instant(s).map(SortKey::Instant).unwrap_or(SortKey::Missing)
            },
            (FieldKind::Flag, FieldValue::Flag(b)) => SortKey::Flag(b),
            (FieldKind::Text, v) => SortKey::Text(v.to_string()),
            _ => SortKey::Missing,
        }
    }
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a wire timestamp.
///
/// Accepts RFC 3339, zone-less date-times (taken as UTC) and bare dates.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
