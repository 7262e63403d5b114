//! # Query Orchestrator
//!
//! The façade a list endpoint talks to. It takes a `Select` for one entity
//! plus the request's [`ListParams`] and applies, in order:
//!
//! 1. field projection (when the resource restricts its columns)
//! 2. eager loading of related entities
//! 3. free-text search
//! 4. field filters, resolved through entity metadata and the filter registry
//! 5. sorting
//!
//! The select comes back unexecuted; [`QueryOrchestrator::paginate`] runs it.
//!
//! ```rust,ignore
//! let orchestrator = QueryOrchestrator::for_model::<Product>();
//! let select = orchestrator.apply_all(product::Entity::find(), &params);
//! let page: Page<product::Model> = orchestrator.paginate_params(select, &db, &params).await?;
//! ```

use sea_orm::{
    ConnectionTrait, EntityTrait, FromQueryResult, JoinType, QuerySelect, QueryTrait, Select,
    sea_query::{Alias, Expr, Order, SimpleExpr},
};
use std::marker::PhantomData;

use crate::errors::{ApiError, FilterError, RegistryError};
use crate::filtering::filter::qualified;
use crate::filtering::{FilterRegistry, apply_search, resolve_sort, sort};
use crate::metadata::{EntityMetadata, ListableResource};
use crate::models::{ColumnOption, FilterMap, FilterView, ListParams, NormalizedFilterParams};
use crate::pagination::{self, Page};

/// Why a filter entry contributed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Null, blank string, empty array or empty object
    EmptyValue,
    /// The entity declares no filter for this field
    UnknownField,
}

/// What happened to one entry of the request's filter map.
#[derive(Debug)]
pub enum FilterOutcome {
    Applied { field: String, predicates: usize },
    Skipped { field: String, reason: SkipReason },
    Failed { field: String, error: FilterError },
}

impl FilterOutcome {
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Applied { field, .. } | Self::Skipped { field, .. } | Self::Failed { field, .. } => {
                field
            }
        }
    }

    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

fn is_empty_value(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Bool(_) | serde_json::Value::Number(_) => false,
    }
}

fn direction_name(order: &Order) -> &'static str {
    match order {
        Order::Asc => "asc",
        _ => "desc",
    }
}

pub struct QueryOrchestrator<'r, E> {
    metadata: EntityMetadata,
    registry: &'r FilterRegistry,
    _entity: PhantomData<fn() -> E>,
}

impl<E: EntityTrait> QueryOrchestrator<'static, E> {
    /// Bind metadata resolved from `R`, dispatching filters through the global registry.
    #[must_use]
    pub fn for_model<R>() -> Self
    where
        R: ListableResource<EntityType = E>,
    {
        Self::with_metadata(R::metadata())
    }

    #[must_use]
    pub fn with_metadata(metadata: EntityMetadata) -> Self {
        Self {
            metadata,
            registry: FilterRegistry::global(),
            _entity: PhantomData,
        }
    }
}

impl<'r, E: EntityTrait> QueryOrchestrator<'r, E> {
    /// Dispatch filters through `registry` instead of the global one.
    #[must_use]
    pub fn with_registry<'a>(self, registry: &'a FilterRegistry) -> QueryOrchestrator<'a, E> {
        QueryOrchestrator {
            metadata: self.metadata,
            registry,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    /// Check that every filter kind the metadata names is registered.
    ///
    /// Meant for startup; request handling tolerates missing kinds.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError::NotFound`] encountered.
    pub fn ensure_filters_registered(&self) -> Result<(), RegistryError> {
        for config in self.metadata.filters.values().flatten() {
            self.registry.lookup(&config.kind)?;
        }
        Ok(())
    }

    /// Apply projection, eager loading, search, filters and sort to `select`.
    #[must_use]
    pub fn apply_all(&self, select: Select<E>, params: &ListParams) -> Select<E> {
        let select = self.apply_projection(select);
        let select = self.apply_relations(select);
        let select = match params.search.as_deref() {
            Some(term) => apply_search(
                select,
                &self.metadata.table,
                term,
                &self.metadata.searchable_fields,
            ),
            None => select,
        };

        let (select, outcomes) = self.apply_filters(select, &params.filters);
        let applied = outcomes.iter().filter(|o| o.is_applied()).count();
        tracing::debug!(
            table = %self.metadata.table,
            applied,
            requested = outcomes.len(),
            "Applied list filters"
        );

        self.apply_sort(select, params)
    }

    fn apply_projection(&self, select: Select<E>) -> Select<E> {
        if self.metadata.selectable_fields.is_empty() {
            return select;
        }
        self.metadata
            .selectable_fields
            .iter()
            .fold(select.select_only(), |select, field| {
                select.column_as(
                    SimpleExpr::from(qualified(&self.metadata.table, field)),
                    field.as_str(),
                )
            })
    }

    /// `LEFT JOIN` each relation under its own alias and load its columns as
    /// `{relation}__{column}`.
    fn apply_relations(&self, select: Select<E>) -> Select<E> {
        self.metadata
            .relations
            .iter()
            .fold(select, |select, relation| {
                let alias = Alias::new(&relation.name);
                let select = select.join_as(JoinType::LeftJoin, (relation.def)(), alias.clone());
                relation.columns.iter().fold(select, |select, column| {
                    select.column_as(
                        SimpleExpr::from(Expr::col((alias.clone(), Alias::new(column)))),
                        format!("{}__{column}", relation.name),
                    )
                })
            })
    }

    /// Apply each entry of `filters` independently.
    ///
    /// A bad entry never aborts the batch. Its outcome is recorded and the
    /// remaining entries still apply.
    pub fn apply_filters(
        &self,
        mut select: Select<E>,
        filters: &FilterMap,
    ) -> (Select<E>, Vec<FilterOutcome>) {
        let mut outcomes = Vec::with_capacity(filters.len());

        for (field, value) in filters {
            let outcome = self.apply_filter(QueryTrait::query(&mut select), field, value);
            match &outcome {
                FilterOutcome::Applied { predicates, .. } => {
                    tracing::debug!(field = %field, predicates, "Filter applied");
                }
                FilterOutcome::Skipped {
                    reason: SkipReason::UnknownField,
                    ..
                } => {
                    tracing::warn!(
                        field = %field,
                        table = %self.metadata.table,
                        "No filter configured for field, skipping"
                    );
                }
                FilterOutcome::Skipped { .. } => {}
                FilterOutcome::Failed { error, .. } => {
                    tracing::warn!(field = %field, error = %error, "Filter failed, skipping");
                }
            }
            outcomes.push(outcome);
        }

        (select, outcomes)
    }

    fn apply_filter(
        &self,
        query: &mut sea_orm::sea_query::SelectStatement,
        field: &str,
        value: &serde_json::Value,
    ) -> FilterOutcome {
        if is_empty_value(value) {
            return FilterOutcome::Skipped {
                field: field.to_string(),
                reason: SkipReason::EmptyValue,
            };
        }

        let descriptors = self.metadata.filters_for_field(field);
        if descriptors.is_empty() {
            return FilterOutcome::Skipped {
                field: field.to_string(),
                reason: SkipReason::UnknownField,
            };
        }

        // All descriptors of a field land together or not at all.
        let mut scratch = query.clone();
        let mut predicates = 0;
        for config in descriptors {
            let result = self
                .registry
                .lookup(&config.kind)
                .map_err(FilterError::from)
                .and_then(|filter| {
                    filter.apply(&mut scratch, &self.metadata.table, config, value)
                });
            if let Err(error) = result {
                return FilterOutcome::Failed {
                    field: field.to_string(),
                    error,
                };
            }
            predicates += 1;
        }
        *query = scratch;

        FilterOutcome::Applied {
            field: field.to_string(),
            predicates,
        }
    }

    /// Order by the request's `sortKey`/`sortDir`, falling back to the
    /// resource defaults. Selected ids, when given, sort first.
    #[must_use]
    pub fn apply_sort(&self, select: Select<E>, params: &ListParams) -> Select<E> {
        let select = sort::selected_first(
            select,
            &self.metadata.table,
            &self.metadata.id_field,
            self.metadata.id_kind,
            &params.selected_ids,
        );
        let resolved = resolve_sort(
            &self.metadata,
            params.sort_key.as_deref(),
            params.sort_dir.as_deref(),
        );
        sort::apply_order(select, &self.metadata.table, &resolved)
    }

    /// Fetch one page of `select`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Database`] when the database rejects the query.
    pub async fn paginate<M, C>(
        &self,
        select: Select<E>,
        db: &C,
        page: u64,
        per_page: u64,
    ) -> Result<Page<M>, ApiError>
    where
        M: FromQueryResult + Send + Sync,
        C: ConnectionTrait,
    {
        pagination::paginate(select, db, page, per_page, self.metadata.max_per_page).await
    }

    /// [`paginate`](Self::paginate) with `page`/`per_page` taken from the request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Database`] when the database rejects the query.
    pub async fn paginate_params<M, C>(
        &self,
        select: Select<E>,
        db: &C,
        params: &ListParams,
    ) -> Result<Page<M>, ApiError>
    where
        M: FromQueryResult + Send + Sync,
        C: ConnectionTrait,
    {
        let page = params.page.unwrap_or(1);
        let per_page = params.per_page.unwrap_or(self.metadata.default_per_page);
        self.paginate(select, db, page, per_page).await
    }

    /// Build the parameter bag a list UI renders its controls from.
    #[must_use]
    pub fn prepare_filters(&self, params: &ListParams) -> NormalizedFilterParams {
        let sort = resolve_sort(
            &self.metadata,
            params.sort_key.as_deref(),
            params.sort_dir.as_deref(),
        );
        let all_columns = ColumnOption::from_fields(&self.metadata.table_fields);
        let visible_columns = all_columns.iter().map(|c| c.name.clone()).collect();

        let filters = self
            .metadata
            .filters
            .iter()
            .flat_map(|(field, configs)| configs.iter().map(move |config| (field, config)))
            .filter_map(|(field, config)| {
                let filter = self.registry.lookup(&config.kind).ok()?;
                Some(FilterView {
                    field: field.clone(),
                    kind: config.kind.clone(),
                    label: filter.label(config),
                    options: filter.options(config),
                })
            })
            .collect();

        NormalizedFilterParams {
            search: params
                .search
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            sort_key: sort.field,
            sort_dir: direction_name(&sort.direction).to_string(),
            page: params.page.unwrap_or(1).max(1),
            per_page: params
                .per_page
                .unwrap_or(self.metadata.default_per_page)
                .clamp(1, self.metadata.max_per_page.max(1)),
            selected_ids: params.selected_ids.clone(),
            all_columns,
            visible_columns,
            filters,
        }
    }
}
