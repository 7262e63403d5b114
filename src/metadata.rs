//! Entity metadata: which columns a listable entity has, which of them are
//! searchable, which relations get eager-loaded and which filters apply to
//! which request field.
//!
//! Metadata is resolved once per orchestrator through [`ListableResource`],
//! or assembled by hand with [`EntityMetadata::builder`].

use sea_orm::{
    ColumnTrait, EntityName, EntityTrait, IdenStatic, Iterable, RelationDef,
    sea_query::{ColumnType, Order},
};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

pub const DEFAULT_SORT_FIELD: &str = "id";
pub const DEFAULT_PER_PAGE: u64 = 12;
pub const MAX_PER_PAGE: u64 = 1_000;

/// One selectable value for filters rendered as a dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Descriptor binding a request field to a registered filter kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Registry key of the filter capability (e.g. `"enum"`)
    pub kind: String,
    /// Column the predicate targets
    pub target_field: String,
    pub label: Option<String>,
    pub options: Vec<FilterOption>,
}

impl FilterConfig {
    pub fn new(kind: impl Into<String>, target_field: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target_field: target_field.into(),
            label: None,
            options: Vec::new(),
        }
    }

    /// Shorthand for an [`EnumFilter`](crate::filtering::EnumFilter) descriptor.
    pub fn enumeration(target_field: impl Into<String>) -> Self {
        Self::new(crate::filtering::EnumFilter::KEY, target_field)
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = FilterOption>,
    {
        self.options = options.into_iter().collect();
        self
    }
}

/// A related entity that is joined and loaded alongside the main rows.
///
/// Loaded columns come back aliased as `{name}__{column}`.
#[derive(Debug, Clone)]
pub struct RelationSpec {
    pub name: String,
    pub def: fn() -> RelationDef,
    pub columns: Vec<String>,
}

impl RelationSpec {
    pub fn new<I, S>(name: impl Into<String>, def: fn() -> RelationDef, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            def,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// How request ids (e.g. `selectedIds`) bind against the id column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdKind {
    #[default]
    Integer,
    Uuid,
    Text,
}

impl IdKind {
    #[must_use]
    pub fn from_column_type(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned => Self::Integer,
            ColumnType::Uuid => Self::Uuid,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortDefaults {
    pub field: String,
    pub direction: Order,
}

impl Default for SortDefaults {
    fn default() -> Self {
        Self {
            field: DEFAULT_SORT_FIELD.to_string(),
            direction: Order::Desc,
        }
    }
}

/// Read-only description of one listable entity.
#[derive(Debug, Clone)]
pub struct EntityMetadata {
    pub table: String,
    pub id_field: String,
    pub id_kind: IdKind,
    pub table_fields: Vec<String>,
    /// Projection; empty selects every column
    pub selectable_fields: Vec<String>,
    pub searchable_fields: Vec<String>,
    pub relations: Vec<RelationSpec>,
    pub filters: BTreeMap<String, Vec<FilterConfig>>,
    pub default_sort: SortDefaults,
    pub default_per_page: u64,
    pub max_per_page: u64,
}

impl EntityMetadata {
    pub fn builder(table: impl Into<String>) -> EntityMetadataBuilder {
        EntityMetadataBuilder {
            metadata: Self {
                table: table.into(),
                id_field: "id".to_string(),
                id_kind: IdKind::default(),
                table_fields: Vec::new(),
                selectable_fields: Vec::new(),
                searchable_fields: Vec::new(),
                relations: Vec::new(),
                filters: BTreeMap::new(),
                default_sort: SortDefaults::default(),
                default_per_page: DEFAULT_PER_PAGE,
                max_per_page: MAX_PER_PAGE,
            },
        }
    }

    /// Filter descriptors bound to a request field, empty if none.
    #[must_use]
    pub fn filters_for_field(&self, field: &str) -> &[FilterConfig] {
        self.filters.get(field).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.table_fields.iter().any(|f| f == field)
    }
}

pub struct EntityMetadataBuilder {
    metadata: EntityMetadata,
}

fn owned<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl EntityMetadataBuilder {
    #[must_use]
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.metadata.id_field = field.into();
        self
    }

    #[must_use]
    pub fn id_kind(mut self, kind: IdKind) -> Self {
        self.metadata.id_kind = kind;
        self
    }

    #[must_use]
    pub fn table_fields<I: IntoIterator<Item = S>, S: Into<String>>(mut self, fields: I) -> Self {
        self.metadata.table_fields = owned(fields);
        self
    }

    #[must_use]
    pub fn selectable_fields<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        fields: I,
    ) -> Self {
        self.metadata.selectable_fields = owned(fields);
        self
    }

    #[must_use]
    pub fn searchable_fields<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        fields: I,
    ) -> Self {
        self.metadata.searchable_fields = owned(fields);
        self
    }

    #[must_use]
    pub fn relation(mut self, relation: RelationSpec) -> Self {
        self.metadata.relations.push(relation);
        self
    }

    /// Adds a descriptor for `field`; a field may carry several.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, config: FilterConfig) -> Self {
        self.metadata
            .filters
            .entry(field.into())
            .or_default()
            .push(config);
        self
    }

    #[must_use]
    pub fn default_sort(mut self, field: impl Into<String>, direction: Order) -> Self {
        self.metadata.default_sort = SortDefaults {
            field: field.into(),
            direction,
        };
        self
    }

    #[must_use]
    pub fn per_page(mut self, default_per_page: u64, max_per_page: u64) -> Self {
        self.metadata.default_per_page = default_per_page.max(1);
        self.metadata.max_per_page = max_per_page.max(self.metadata.default_per_page);
        self
    }

    #[must_use]
    pub fn build(self) -> EntityMetadata {
        self.metadata
    }
}

/// Per-entity listing configuration, resolved into [`EntityMetadata`].
///
/// Only `EntityType` is required. Every column is listed and nothing is
/// searchable, joined or filterable unless overridden.
///
/// ```rust,ignore
/// impl ListableResource for Product {
///     type EntityType = product::Entity;
///
///     const DEFAULT_SORT_FIELD: &'static str = "name";
///
///     fn searchable_fields() -> Vec<&'static str> {
///         vec!["name", "description"]
///     }
///
///     fn filters() -> Vec<(&'static str, FilterConfig)> {
///         vec![("status", FilterConfig::enumeration("status"))]
///     }
/// }
/// ```
pub trait ListableResource {
    type EntityType: EntityTrait;

    const ID_FIELD: &'static str = "id";
    const DEFAULT_SORT_FIELD: &'static str = DEFAULT_SORT_FIELD;
    const DEFAULT_SORT_DIRECTION: Order = Order::Desc;
    const DEFAULT_PER_PAGE: u64 = DEFAULT_PER_PAGE;
    const MAX_PER_PAGE: u64 = MAX_PER_PAGE;

    #[must_use]
    fn table_name() -> String {
        Self::EntityType::default().table_name().to_string()
    }

    #[must_use]
    fn table_fields() -> Vec<String> {
        <Self::EntityType as EntityTrait>::Column::iter()
            .map(|column| column.as_str().to_string())
            .collect()
    }

    /// Read from the id column's type; `Integer` if the column is not found.
    #[must_use]
    fn id_kind() -> IdKind {
        <Self::EntityType as EntityTrait>::Column::iter()
            .find(|column| column.as_str() == Self::ID_FIELD)
            .map_or_else(IdKind::default, |column| {
                IdKind::from_column_type(column.def().get_column_type())
            })
    }

    #[must_use]
    fn selectable_fields() -> Vec<&'static str> {
        vec![]
    }

    #[must_use]
    fn searchable_fields() -> Vec<&'static str> {
        vec![]
    }

    #[must_use]
    fn relations() -> Vec<RelationSpec> {
        vec![]
    }

    #[must_use]
    fn filters() -> Vec<(&'static str, FilterConfig)> {
        vec![]
    }

    #[must_use]
    fn metadata() -> EntityMetadata {
        let mut builder = EntityMetadata::builder(Self::table_name())
            .id_field(Self::ID_FIELD)
            .id_kind(Self::id_kind())
            .table_fields(Self::table_fields())
            .selectable_fields(Self::selectable_fields())
            .searchable_fields(Self::searchable_fields())
            .default_sort(Self::DEFAULT_SORT_FIELD, Self::DEFAULT_SORT_DIRECTION)
            .per_page(Self::DEFAULT_PER_PAGE, Self::MAX_PER_PAGE);
        for relation in Self::relations() {
            builder = builder.relation(relation);
        }
        for (field, config) in Self::filters() {
            builder = builder.filter(field, config);
        }
        builder.build()
    }
}
