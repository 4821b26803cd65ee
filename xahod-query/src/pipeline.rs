//! Filter → search → sort → paginate

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::trace;
use xahod_domain::{ListParams, Pagination, SortingOrder};

use crate::error::QueryError;
use crate::field::{Queryable, SortKey};

/// One page of a list query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on this page, derived fields refreshed
    pub data: Vec<T>,
    /// Requested page and size, with the filtered total
    pub pagination: Pagination,
}

/// Run the full list query over `records`.
///
/// `total` in the result counts the records that passed the active filter
/// and the search, before slicing. A page past the end is empty.
pub fn query<T: Queryable>(records: &[T], params: &ListParams) -> Result<Page<T>, QueryError> {
    let page = params.page_or_default();
    let per_page = params.per_page_or_default();

    if page == 0 {
        return Err(QueryError::InvalidArgument("page must be at least 1".to_string()));
    }
    if per_page == 0 {
        return Err(QueryError::InvalidArgument("perPage must be at least 1".to_string()));
    }

    let sorting = params.sorting();
    let resolved = sorting.resolved();
    if let Some((field, _)) = resolved {
        if T::field_spec(field).is_none() {
            return Err(QueryError::UnknownField(field.to_string()));
        }
    }

    let filters = params.filters();
    let mut selected = filter_active(records, filters.is_active);
    if let Some(needle) = filters.search_text() {
        selected = search(selected, needle);
    }
    if let Some((field, order)) = resolved {
        sort(&mut selected, field, order)?;
    }

    let total = selected.len();
    let data = paginate(&selected, page, per_page)
        .iter()
        .map(|record| {
            let mut record = (*record).clone();
            record.refresh_derived();
            record
        })
        .collect::<Vec<_>>();

    trace!(total, page, per_page, returned = data.len(), "List query");

    Ok(Page {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
        },
    })
}

/// Keep records whose active flag equals `is_active` (all when `None`)
pub fn filter_active<T: Queryable>(records: &[T], is_active: Option<bool>) -> Vec<&T> {
    match is_active {
        Some(wanted) => records.iter().filter(|r| r.is_active() == wanted).collect(),
        None => records.iter().collect(),
    }
}

/// Keep records where any searchable field contains `needle`, ignoring case.
///
/// An empty needle keeps everything.
pub fn search<'a, T: Queryable>(records: Vec<&'a T>, needle: &str) -> Vec<&'a T> {
    if needle.is_empty() {
        return records;
    }

    let needle = needle.to_lowercase();
    records
        .into_iter()
        .filter(|record| {
            T::FIELDS.iter().filter(|spec| spec.searchable).any(|spec| {
                record
                    .field(spec.name)
                    .map(|value| value.to_string().to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        })
        .collect()
}

/// Stable sort by `field` using the comparator of its declared kind
pub fn sort<T: Queryable>(
    records: &mut [&T],
    field: &str,
    order: SortingOrder,
) -> Result<(), QueryError> {
    let spec = T::field_spec(field).ok_or_else(|| QueryError::UnknownField(field.to_string()))?;
    let key = |record: &&T| SortKey::from_value(spec.kind, record.field(spec.name));

    match order {
        SortingOrder::Asc => records.sort_by_cached_key(key),
        SortingOrder::Desc => records.sort_by_cached_key(|r| Reverse(key(r))),
    }

    Ok(())
}

/// Slice `[(page-1)*per_page, page*per_page)`, clamped to the input
pub fn paginate<'s, T>(records: &'s [T], page: usize, per_page: usize) -> &'s [T] {
    let start = page.saturating_sub(1).saturating_mul(per_page);
    if start >= records.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(records.len());
    &records[start..end]
}
