use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{StringWithSeparator, formats::CommaSeparator, serde_as};
use utoipa::{IntoParams, ToSchema};

use crate::metadata::FilterOption;

/// Request field name -> filter value.
pub type FilterMap = serde_json::Map<String, serde_json::Value>;

/// Columns whose name ends with this suffix are foreign keys and stay out of
/// the UI column list.
pub const HIDDEN_COLUMN_SUFFIX: &str = "_id";

/// Query parameters for searching, filtering, sorting and paginating a list.
///
/// # Filtering
/// `filters` maps a field name to a value. In a query string it is a
/// JSON-encoded object; in a JSON body it may be the object itself:
/// ```json
/// {"status": "active", "category_id": [1, 2]}
/// ```
/// Null, empty-string and empty-container values are ignored.
///
/// # Sorting
/// `sortKey` names a column and `sortDir` is `asc` or `desc`. Unknown columns
/// fall back to the resource's default sort.
///
/// # Pagination
/// `page` is 1-based and defaults to 1; `per_page` defaults to the resource's
/// page size (12 unless configured).
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct ListParams {
    /// Free-text search across the resource's searchable columns.
    #[param(example = "widget")]
    pub search: Option<String>,
    /// Column to sort by.
    #[serde(rename = "sortKey")]
    #[param(example = "name")]
    pub sort_key: Option<String>,
    /// Sort direction, `asc` or `desc`.
    #[serde(rename = "sortDir")]
    #[param(example = "asc")]
    pub sort_dir: Option<String>,
    /// Page number (1-based).
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Number of items per page.
    #[param(example = 12)]
    pub per_page: Option<u64>,
    /// JSON-encoded field filters.
    #[serde(deserialize_with = "deserialize_filters")]
    #[param(value_type = Option<String>, example = r#"{"status":"active"}"#)]
    pub filters: FilterMap,
    /// Comma-separated ids that sort ahead of all other rows.
    #[serde(rename = "selectedIds")]
    #[serde_as(as = "StringWithSeparator::<CommaSeparator, String>")]
    #[param(value_type = Option<String>, example = "3,7")]
    pub selected_ids: Vec<String>,
}

impl ListParams {
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.filters.insert(field.into(), value);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, key: impl Into<String>, dir: impl Into<String>) -> Self {
        self.sort_key = Some(key.into());
        self.sort_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: u64, per_page: u64) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFilters {
    Encoded(String),
    Map(FilterMap),
}

fn deserialize_filters<'de, D>(deserializer: D) -> Result<FilterMap, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawFilters>::deserialize(deserializer)? {
        Some(RawFilters::Encoded(raw)) => parse_filter_json(&raw),
        Some(RawFilters::Map(map)) => map,
        None => FilterMap::new(),
    })
}

/// Malformed filter JSON is bad user input: it is logged and ignored rather
/// than failing the whole request.
fn parse_filter_json(raw: &str) -> FilterMap {
    if raw.trim().is_empty() {
        return FilterMap::new();
    }
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(filters = %other, "Ignoring filters that are not a JSON object");
            FilterMap::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Invalid JSON in filters parameter");
            FilterMap::new()
        }
    }
}

/// Humanize a column name: `category_name` -> `Category name`.
#[must_use]
pub fn humanize(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ColumnOption {
    pub name: String,
    pub label: String,
}

impl ColumnOption {
    /// Columns offered to the UI: everything except `*_id` foreign keys.
    pub fn from_fields<I, S>(fields: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        fields
            .into_iter()
            .filter(|name| !name.as_ref().ends_with(HIDDEN_COLUMN_SUFFIX))
            .map(|name| Self {
                name: name.as_ref().to_string(),
                label: humanize(name.as_ref()),
            })
            .collect()
    }
}

/// A filter as rendered by a list UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FilterView {
    pub field: String,
    pub kind: String,
    pub label: String,
    pub options: Vec<FilterOption>,
}

/// UI-facing parameter bag produced by
/// [`QueryOrchestrator::prepare_filters`](crate::QueryOrchestrator::prepare_filters).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NormalizedFilterParams {
    pub search: String,
    #[serde(rename = "sortKey")]
    pub sort_key: String,
    #[serde(rename = "sortDir")]
    pub sort_dir: String,
    pub page: u64,
    pub per_page: u64,
    #[serde(rename = "selectedIds")]
    pub selected_ids: Vec<String>,
    #[serde(rename = "allColumns")]
    pub all_columns: Vec<ColumnOption>,
    #[serde(rename = "visibleColumns")]
    pub visible_columns: Vec<String>,
    pub filters: Vec<FilterView>,
}
