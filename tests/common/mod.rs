#![allow(dead_code)]

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use listquery::{ApiError, ListParams, Page, QueryOrchestrator};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use sea_orm_migration::prelude::*;

pub mod category_entity;
pub mod product_entity;

use product_entity::Product;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

pub async fn insert_category(db: &DatabaseConnection, name: &str) -> category_entity::Model {
    category_entity::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert category")
}

pub async fn insert_product(
    db: &DatabaseConnection,
    name: &str,
    description: Option<&str>,
    status: &str,
    category_id: Option<i32>,
) -> product_entity::Model {
    product_entity::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.map(str::to_string)),
        status: Set(status.to_string()),
        category_id: Set(category_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert product")
}

/// Seeds two categories and five products:
///
/// | id | name           | status   | category |
/// |----|----------------|----------|----------|
/// | 1  | Red Widget     | active   | Tools    |
/// | 2  | Blue Widget    | draft    | Tools    |
/// | 3  | Garden Hose    | active   | Garden   |
/// | 4  | Model 0 Lamp   | archived | none     |
/// | 5  | Desk Organizer | active   | none     |
pub async fn seed_catalog(db: &DatabaseConnection) {
    let tools = insert_category(db, "Tools").await;
    let garden = insert_category(db, "Garden").await;

    insert_product(db, "Red Widget", Some("A sturdy widget"), "active", Some(tools.id)).await;
    insert_product(db, "Blue Widget", None, "draft", Some(tools.id)).await;
    insert_product(
        db,
        "Garden Hose",
        Some("Twenty metres, fits any widget tap"),
        "active",
        Some(garden.id),
    )
    .await;
    insert_product(db, "Model 0 Lamp", Some("Warm light"), "archived", None).await;
    insert_product(db, "Desk Organizer", None, "active", None).await;
}

/// Seeds `count` products named `Item 1..=count`, all `active`.
pub async fn seed_items(db: &DatabaseConnection, count: usize) {
    for i in 1..=count {
        insert_product(db, &format!("Item {i}"), None, "active", None).await;
    }
}

pub async fn list_products(
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListParams>,
) -> Result<Page<product_entity::Model>, ApiError> {
    let orchestrator = QueryOrchestrator::for_model::<Product>();
    let select = orchestrator.apply_all(product_entity::Entity::find(), &params);
    orchestrator.paginate_params(select, &db, &params).await
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    let api = Router::new()
        .route("/products", get(list_products))
        .with_state(db);

    Router::new().nest("/api/v1", api)
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateCatalogTables)]
    }
}

pub struct CreateCatalogTables;

impl MigrationName for CreateCatalogTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_catalog_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateCatalogTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        manager
            .create_table(schema.create_table_from_entity(category_entity::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(product_entity::Entity))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(product_entity::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(category_entity::Entity).to_owned())
            .await?;
        Ok(())
    }
}
