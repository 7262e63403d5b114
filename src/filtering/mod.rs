//! # Filtering, Search & Sorting
//!
//! Building blocks the [`QueryOrchestrator`](crate::QueryOrchestrator) chains
//! together. Each one is usable on its own against a `sea_orm::Select`.
//!
//! ## Main Components
//!
//! - **[`Filter`]**: a stateless capability turning one field value into a predicate
//! - **[`FilterRegistry`]**: process-wide `key -> Filter` bindings, filled at bootstrap
//! - **[`EnumFilter`]**: the built-in equality / `IN` filter, registered as `"enum"`
//! - **[`apply_search`]**: OR-combined `LIKE '%term%'` across searchable columns
//! - **[`resolve_sort`]** and [`parse_order`]: request sort key/direction handling
//!
//! ## Query Parameter Examples
//!
//! ```rust,ignore
//! // Free-text search over the resource's searchable columns
//! GET /products?search=widget
//!
//! // Field filters, JSON-encoded; arrays become IN (...)
//! GET /products?filters={"status":"active","category_id":[1,2]}
//!
//! // Sorting
//! GET /products?sortKey=name&sortDir=asc
//!
//! // Pagination
//! GET /products?page=2&per_page=25
//! ```
//!
//! ## Adding a Filter Kind
//!
//! ```rust,ignore
//! struct PrefixFilter;
//!
//! impl Filter for PrefixFilter {
//!     fn key(&self) -> &str {
//!         "prefix"
//!     }
//!
//!     fn apply(
//!         &self,
//!         query: &mut SelectStatement,
//!         table: &str,
//!         config: &FilterConfig,
//!         value: &serde_json::Value,
//!     ) -> Result<(), FilterError> {
//!         let prefix = value.as_str().ok_or_else(|| {
//!             FilterError::invalid_value("prefix", &config.target_field, "expected a string")
//!         })?;
//!         query.and_where(
//!             Expr::col((Alias::new(table), Alias::new(&config.target_field)))
//!                 .like(format!("{prefix}%")),
//!         );
//!         Ok(())
//!     }
//! }
//!
//! // At startup, before serving requests
//! listquery::register_filter("prefix", PrefixFilter);
//! ```

pub mod filter;
pub mod registry;
pub mod search;
pub mod sort;

// Re-export commonly used items
pub use filter::{EnumFilter, Filter};
pub use registry::{FilterRegistry, register_filter};
pub use search::{MAX_SEARCH_TERM_LENGTH, apply_search};
pub use sort::{parse_order, resolve_sort};
