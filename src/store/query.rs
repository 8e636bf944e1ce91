//! Listing parameters shared by every searchable collection
//!
//! Query-string values are advisory: anything unparsable or out of range
//! falls back to its default instead of failing the request.

use std::cmp::Ordering;
use std::collections::HashMap;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(raw: Option<&str>, default: SortOrder) -> SortOrder {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            _ => default,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Sort whitelist and defaults for one collection
#[derive(Debug, Clone, Copy)]
pub struct SortSpec {
    pub fields: &'static [&'static str],
    pub default_field: &'static str,
    pub default_order: SortOrder,
}

pub const SEQUENCE_SORT: SortSpec = SortSpec {
    fields: &["id", "title", "level", "theme"],
    default_field: "id",
    default_order: SortOrder::Asc,
};

pub const CATALOG_SORT: SortSpec = SortSpec {
    fields: &["date", "title"],
    default_field: "date",
    default_order: SortOrder::Desc,
};

/// Parsed search/listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Lowercased substring matched against title and description
    pub text: Option<String>,
    pub page: usize,
    pub page_size: usize,
    pub sort_by: &'static str,
    pub order: SortOrder,
}

impl ListQuery {
    pub fn from_params(params: &HashMap<String, String>, sort: SortSpec) -> Self {
        let text = params
            .get("query")
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let sort_by = params
            .get("sort_by")
            .and_then(|field| sort.fields.iter().find(|f| **f == field.as_str()))
            .copied()
            .unwrap_or(sort.default_field);

        Self {
            text,
            page: positive_or(params.get("page"), DEFAULT_PAGE),
            page_size: positive_or(params.get("page_size"), DEFAULT_PAGE_SIZE),
            sort_by,
            order: SortOrder::parse(params.get("sort_order").map(String::as_str), sort.default_order),
        }
    }

    /// Case-insensitive substring test over title and description
    pub fn matches_text(&self, title: &str, description: Option<&str>) -> bool {
        match &self.text {
            None => true,
            Some(needle) => {
                title.to_lowercase().contains(needle)
                    || description.is_some_and(|d| d.to_lowercase().contains(needle))
            }
        }
    }

    /// Slice out the requested page; out-of-range pages are empty
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let start = (self.page - 1).saturating_mul(self.page_size);
        items.into_iter().skip(start).take(self.page_size).collect()
    }
}

fn positive_or(raw: Option<&String>, default: usize) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v >= 1)
        .unwrap_or(default)
}
