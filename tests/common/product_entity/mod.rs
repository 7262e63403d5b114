use listquery::{FilterConfig, FilterOption, ListableResource, RelationSpec};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Order;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: String,
    pub category_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category_entity::Entity",
        from = "Column::CategoryId",
        to = "super::category_entity::Column::Id"
    )]
    Category,
}

impl Related<super::category_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn category_relation() -> RelationDef {
    Relation::Category.def()
}

/// Listing configuration for the `products` table.
pub struct Product;

impl ListableResource for Product {
    type EntityType = Entity;

    const DEFAULT_SORT_DIRECTION: Order = Order::Asc;
    const DEFAULT_PER_PAGE: u64 = 10;
    const MAX_PER_PAGE: u64 = 50;

    fn searchable_fields() -> Vec<&'static str> {
        vec!["name", "description"]
    }

    fn relations() -> Vec<RelationSpec> {
        vec![RelationSpec::new("category", category_relation, ["name"])]
    }

    fn filters() -> Vec<(&'static str, FilterConfig)> {
        vec![
            (
                "status",
                FilterConfig::enumeration("status").with_options([
                    FilterOption::new("active", "Active"),
                    FilterOption::new("draft", "Draft"),
                ]),
            ),
            (
                "category_id",
                FilterConfig::enumeration("category_id").with_label("Category"),
            ),
        ]
    }
}
