//! Search, filter, sort and paginate Sea-ORM list queries from request
//! parameters.
//!
//! Describe an entity once with [`ListableResource`], then let a
//! [`QueryOrchestrator`] turn [`ListParams`] into a ready `Select`:
//!
//! ```rust,ignore
//! async fn list_products(
//!     State(db): State<DatabaseConnection>,
//!     Query(params): Query<ListParams>,
//! ) -> Result<Page<product::Model>, ApiError> {
//!     let orchestrator = QueryOrchestrator::for_model::<Product>();
//!     let select = orchestrator.apply_all(product::Entity::find(), &params);
//!     orchestrator.paginate_params(select, &db, &params).await
//! }
//! ```

pub mod errors;
pub mod filtering;
pub mod metadata;
pub mod models;
pub mod orchestrator;
pub mod pagination;

pub use errors::{ApiError, FilterError, RegistryError};
pub use filtering::{EnumFilter, Filter, FilterRegistry, apply_search, register_filter};
pub use metadata::{
    EntityMetadata, FilterConfig, FilterOption, IdKind, ListableResource, RelationSpec,
};
pub use models::{ListParams, NormalizedFilterParams};
pub use orchestrator::{FilterOutcome, QueryOrchestrator, SkipReason};
pub use pagination::{Page, paginate};

/// Register filter kinds in the global registry at startup.
/// Usage: `register_filters!("prefix" => PrefixFilter, "range" => RangeFilter)`;
#[macro_export]
macro_rules! register_filters {
    ($($key:expr => $filter:expr),+ $(,)?) => {
        $(
            $crate::register_filter($key, $filter);
        )+
    };
}
pub use serde_with;
