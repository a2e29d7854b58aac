//! Query translation: turns list parameters (pagination, sort, filter,
//! search) into a document-store query.
//!
//! Translation is deliberately forgiving: an unknown `sort_by` falls back to
//! `created_at` instead of erroring, so a stale field reference from an
//! evolved schema can never break a listing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tessella_core::{Entity, Record};
use tracing::debug;

pub const DEFAULT_PER_PAGE: u32 = 50;
pub const MAX_PER_PAGE: u32 = 100;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Raw listing parameters as a caller supplies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    pub page: u32,
    pub per_page: u32,
    /// Field name to sort by; `None` or an unknown name means `created_at`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    /// Exact-match filters, field name to value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, Value>,
    /// Free-text substring search across all string-valued fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            sort_by: None,
            sort_order: SortOrder::Asc,
            filters: BTreeMap::new(),
            search: None,
            include_archived: false,
        }
    }
}

impl ListParams {
    pub fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = order;
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filters.insert(field.into(), value);
        self
    }

    pub fn with_search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn include_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }

    /// Translates these parameters into a concrete query against the given
    /// entity's schema.
    pub fn to_query(&self, entity: &Entity) -> RecordQuery {
        let page = self.page.max(1);
        let per_page = self.per_page.clamp(1, MAX_PER_PAGE);

        let mut filters = Vec::new();
        if !self.include_archived {
            filters.push(RecordFilter::Archived(false));
        }
        for (field, value) in &self.filters {
            filters.push(RecordFilter::Exact {
                field: field.clone(),
                value: value.clone(),
            });
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            filters.push(RecordFilter::AnyFieldContains {
                fields: entity
                    .string_field_names()
                    .into_iter()
                    .map(String::from)
                    .collect(),
                needle: search.to_string(),
            });
        }

        let sort_field = match self.sort_by.as_deref() {
            None | Some("created_at") => None,
            Some(name) => {
                if entity.field(name).is_some() {
                    Some(name.to_string())
                } else {
                    debug!(field = %name, entity = %entity.entity_name,
                        "unknown sort field, falling back to created_at");
                    None
                }
            }
        };

        RecordQuery {
            filters,
            sort: SortKey {
                field: sort_field,
                order: self.sort_order,
            },
            offset: (page as usize - 1) * per_page as usize,
            limit: per_page as usize,
            page,
            per_page,
        }
    }
}

/// A single predicate in a translated query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordFilter {
    /// Field equals value, literally (no partial match).
    Exact { field: String, value: Value },
    /// Case-insensitive substring match ORed across the given fields.
    AnyFieldContains { fields: Vec<String>, needle: String },
    /// Matches records with the given archived flag.
    Archived(bool),
}

impl RecordFilter {
    /// Checks whether a record satisfies this predicate.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            RecordFilter::Exact { field, value } => match record.get_field(field) {
                Some(actual) => actual == value,
                None => value.is_null(),
            },
            RecordFilter::AnyFieldContains { fields, needle } => {
                let needle = needle.to_lowercase();
                fields.iter().any(|field| {
                    matches!(
                        record.get_field(field),
                        Some(Value::String(s)) if s.to_lowercase().contains(&needle)
                    )
                })
            }
            RecordFilter::Archived(archived) => record.is_archived == *archived,
        }
    }
}

/// Sort key; `field = None` means the `created_at` audit column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: Option<String>,
    pub order: SortOrder,
}

/// A translated document-store query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordQuery {
    pub filters: Vec<RecordFilter>,
    pub sort: SortKey,
    pub offset: usize,
    pub limit: usize,
    pub page: u32,
    pub per_page: u32,
}

impl RecordQuery {
    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }
}

impl Default for RecordQuery {
    /// First page, default page size, newest-last creation order, archived
    /// records excluded.
    fn default() -> Self {
        Self {
            filters: vec![RecordFilter::Archived(false)],
            sort: SortKey {
                field: None,
                order: SortOrder::Asc,
            },
            offset: 0,
            limit: DEFAULT_PER_PAGE as usize,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Pagination metadata returned with every record page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Pagination {
    #[must_use]
    pub fn compute(page: u32, per_page: u32, total: usize) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            ((total + per_page as usize - 1) / per_page as usize) as u32
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPage {
    pub records: Vec<Record>,
    pub pagination: Pagination,
}
