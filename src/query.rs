//! Pagination and field filtering over a catalog snapshot.
//!
//! Both operations are pure: they borrow the records and never mutate them.
//! An empty catalog is reported as [`QueryError::NoData`] rather than as an
//! empty result, since it means loading failed, not that nothing matched.

use serde::Serialize;
use tracing::trace;

use crate::error::QueryError;
use crate::record::{BookField, BookRecord};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub books: Vec<BookRecord>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub books: Vec<BookRecord>,
    pub total: usize,
}

// ------------- Pagination -------------
/// Returns one page of `records`. A non-positive `limit` becomes
/// [`DEFAULT_LIMIT`] and `page` is clamped into `1..=total_pages`.
pub fn paginate(records: &[BookRecord], page: i64, limit: i64) -> Result<Page, QueryError> {
    if records.is_empty() {
        return Err(QueryError::NoData);
    }
    let limit = if limit > 0 { limit as usize } else { DEFAULT_LIMIT as usize };
    let total = records.len();
    let total_pages = total.div_ceil(limit);
    let page = page.clamp(1, total_pages as i64) as usize;

    let start = (page - 1).saturating_mul(limit);
    let books = if start >= total {
        Vec::new()
    } else {
        let end = start.saturating_add(limit).min(total);
        records[start..end].to_vec()
    };
    Ok(Page {
        books,
        total,
        page,
        limit,
        total_pages,
    })
}

// ------------- Filtering -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    field: BookField,
    needle: String,
}

impl Criterion {
    pub fn new(field: BookField, value: &str) -> Self {
        Self {
            field,
            needle: value.to_lowercase(),
        }
    }
    pub fn field(&self) -> BookField {
        self.field
    }
    pub fn matches(&self, record: &BookRecord) -> bool {
        // an empty needle is contained in everything, including empty fields
        record.get(self.field).to_lowercase().contains(&self.needle)
    }
}

/// Validates `pairs` against the record schema. The first unknown field
/// rejects the whole set.
pub fn parse_criteria<K, V>(pairs: &[(K, V)]) -> Result<Vec<Criterion>, QueryError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if pairs.is_empty() {
        return Err(QueryError::EmptyCriteria);
    }
    pairs
        .iter()
        .map(|(field, value)| {
            field
                .as_ref()
                .parse::<BookField>()
                .map(|field| Criterion::new(field, value.as_ref()))
        })
        .collect()
}

/// Keeps the records matching every criterion, each one narrowing the
/// matches of the previous.
pub fn filter<K, V>(records: &[BookRecord], pairs: &[(K, V)]) -> Result<SearchResult, QueryError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let criteria = parse_criteria(pairs)?;
    if records.is_empty() {
        return Err(QueryError::NoData);
    }
    let mut matches: Vec<&BookRecord> = records.iter().collect();
    for criterion in &criteria {
        matches.retain(|record| criterion.matches(record));
        trace!(field = %criterion.field(), remaining = matches.len(), "criterion applied");
    }
    let books: Vec<BookRecord> = matches.into_iter().cloned().collect();
    Ok(SearchResult {
        total: books.len(),
        books,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Vec<BookRecord> {
        (1..=n)
            .map(|i| BookRecord {
                name: format!("Book {i}"),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn non_positive_limit_falls_back_to_default() {
        let records = numbered(150);
        for limit in [0, -1, -100] {
            let page = paginate(&records, 1, limit).unwrap();
            assert_eq!(page.limit, 100);
            assert_eq!(page.books.len(), 100);
            assert_eq!(page.total_pages, 2);
        }
    }

    #[test]
    fn page_is_clamped_into_range() {
        let records = numbered(10);
        assert_eq!(paginate(&records, 0, 3).unwrap().page, 1);
        assert_eq!(paginate(&records, -7, 3).unwrap().page, 1);
        let last = paginate(&records, 99, 3).unwrap();
        assert_eq!(last.page, 4);
        assert_eq!(last.books.len(), 1);
        assert_eq!(last.books[0].name, "Book 10");
    }

    #[test]
    fn huge_limit_returns_everything_on_one_page() {
        let page = paginate(&numbered(7), i64::MAX, i64::MAX).unwrap();
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);
        assert_eq!(page.books.len(), 7);
    }

    #[test]
    fn empty_catalog_has_no_data() {
        assert_eq!(paginate(&[], 1, 10), Err(QueryError::NoData));
        assert_eq!(filter(&[], &[("name", "x")]), Err(QueryError::NoData));
    }

    #[test]
    fn criteria_are_checked_before_data() {
        let none: [(&str, &str); 0] = [];
        assert_eq!(filter(&[], &none), Err(QueryError::EmptyCriteria));
        assert_eq!(
            filter(&[], &[("name", "x"), ("colour", "red")]),
            Err(QueryError::InvalidField("colour".into()))
        );
    }

    #[test]
    fn empty_value_matches_empty_fields() {
        let records = numbered(3);
        let result = filter(&records, &[("genre", "")]).unwrap();
        assert_eq!(result.total, 3);
    }
}
