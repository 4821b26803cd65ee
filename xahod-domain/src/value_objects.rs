//! Value Objects for list queries
//!
//! Filters, sorting and pagination, plus the flat camelCase record
//! (`ListParams`) that carries all three across the query boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// First page number
pub const DEFAULT_PAGE: usize = 1;

/// Default page size
pub const DEFAULT_PER_PAGE: usize = 10;

/// Domain validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Argument outside its valid range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Status string not in the entity's enumeration
    #[error("Unknown status: {0}")]
    UnknownStatus(String),
}

// =============================================================================
// Sorting
// =============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortingOrder {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl fmt::Display for SortingOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortingOrder::Asc => f.write_str("asc"),
            SortingOrder::Desc => f.write_str("desc"),
        }
    }
}

/// Sort field and direction. Sorting only applies when both are set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sorting {
    /// Field name as it appears on the wire
    pub sort_by: Option<String>,
    /// Direction
    pub sorting_order: Option<SortingOrder>,
}

impl Sorting {
    /// Sort by `field` in `order`
    pub fn by(field: impl Into<String>, order: SortingOrder) -> Self {
        Self {
            sort_by: Some(field.into()),
            sorting_order: Some(order),
        }
    }

    /// Field and direction, if both are set
    pub fn resolved(&self) -> Option<(&str, SortingOrder)> {
        match (&self.sort_by, self.sorting_order) {
            (Some(field), Some(order)) => Some((field.as_str(), order)),
            _ => None,
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Page position and the size of the filtered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page number
    pub page: usize,
    /// Page size
    pub per_page: usize,
    /// Number of records that passed the filters
    pub total: usize,
}

impl Pagination {
    /// Validated constructor
    pub fn new(page: usize, per_page: usize, total: usize) -> Result<Self, DomainError> {
        if page == 0 {
            return Err(DomainError::InvalidArgument("page must be at least 1".to_string()));
        }
        if per_page == 0 {
            return Err(DomainError::InvalidArgument(
                "perPage must be at least 1".to_string(),
            ));
        }
        Ok(Self { page, per_page, total })
    }

    /// Number of pages needed for `total` (zero when empty)
    pub fn page_count(&self) -> usize {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            total: 0,
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Active-flag and free-text filters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilters {
    /// Keep only records whose derived active flag equals this
    pub is_active: Option<bool>,
    /// Case-insensitive substring over searchable fields
    pub search: Option<String>,
}

impl ListFilters {
    /// Search text, if set and non-empty
    pub fn search_text(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

// =============================================================================
// ListParams
// =============================================================================

/// Flat list-query request: filters, sorting and paging in one record.
///
/// Every field is optional. Missing page and page size fall back to
/// [`DEFAULT_PAGE`] and [`DEFAULT_PER_PAGE`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Active filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Search text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Sort field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// Sort direction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting_order: Option<SortingOrder>,
    /// 1-based page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    /// Page size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<usize>,
}

impl ListParams {
    /// Compose the flat record from its three parts
    pub fn compose(filters: &ListFilters, sorting: &Sorting, pagination: &Pagination) -> Self {
        Self {
            is_active: filters.is_active,
            search: filters.search.clone(),
            sort_by: sorting.sort_by.clone(),
            sorting_order: sorting.sorting_order,
            page: Some(pagination.page),
            per_page: Some(pagination.per_page),
        }
    }

    /// Filter part
    pub fn filters(&self) -> ListFilters {
        ListFilters {
            is_active: self.is_active,
            search: self.search.clone(),
        }
    }

    /// Sorting part
    pub fn sorting(&self) -> Sorting {
        Sorting {
            sort_by: self.sort_by.clone(),
            sorting_order: self.sorting_order,
        }
    }

    /// Requested page, defaulted
    pub fn page_or_default(&self) -> usize {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    /// Requested page size, defaulted
    pub fn per_page_or_default(&self) -> usize {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_rejects_zero() {
        assert!(Pagination::new(0, 10, 0).is_err());
        assert!(Pagination::new(1, 0, 0).is_err());
        assert_eq!(Pagination::new(2, 5, 11).unwrap().page_count(), 3);
    }

    #[test]
    fn test_pagination_default() {
        let p = Pagination::default();
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 10);
        assert_eq!(p.total, 0);
        assert_eq!(p.page_count(), 0);
    }

    #[test]
    fn test_sorting_resolved_needs_both_parts() {
        let partial = Sorting {
            sort_by: Some("pair".to_string()),
            sorting_order: None,
        };
        assert!(partial.resolved().is_none());

        let full = Sorting::by("pair", SortingOrder::Desc);
        assert_eq!(full.resolved(), Some(("pair", SortingOrder::Desc)));
    }

    #[test]
    fn test_empty_search_is_no_search() {
        let filters = ListFilters {
            is_active: None,
            search: Some(String::new()),
        };
        assert_eq!(filters.search_text(), None);
    }

    #[test]
    fn test_list_params_wire_format() {
        let params: ListParams = serde_json::from_str(
            r#"{"isActive":true,"search":"xrp","sortBy":"creation_time","sortingOrder":"desc","page":2,"perPage":5}"#,
        )
        .unwrap();

        assert_eq!(params.is_active, Some(true));
        assert_eq!(params.sorting_order, Some(SortingOrder::Desc));
        assert_eq!(params.per_page_or_default(), 5);

        let empty: ListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.page_or_default(), DEFAULT_PAGE);
        assert_eq!(empty.per_page_or_default(), DEFAULT_PER_PAGE);
        assert_eq!(serde_json::to_string(&empty).unwrap(), "{}");
    }

    #[test]
    fn test_compose_roundtrips_parts() {
        let filters = ListFilters {
            is_active: Some(false),
            search: Some("abc".to_string()),
        };
        let sorting = Sorting::by("utid", SortingOrder::Asc);
        let pagination = Pagination::new(3, 20, 100).unwrap();

        let params = ListParams::compose(&filters, &sorting, &pagination);

        assert_eq!(params.filters(), filters);
        assert_eq!(params.sorting(), sorting);
        assert_eq!(params.page, Some(3));
        assert_eq!(params.per_page, Some(20));
    }
}
