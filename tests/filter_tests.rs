use listquery::{
    EntityMetadata, Filter, FilterConfig, FilterError, FilterOutcome, FilterRegistry,
    QueryOrchestrator, RegistryError, orchestrator::SkipReason,
};
use sea_orm::sea_query::{Alias, Expr, SelectStatement};
use sea_orm::{EntityTrait, QueryOrder};
use serde_json::{Map, Value, json};

mod common;
use common::{insert_product, product_entity, seed_catalog, setup_test_db};
use product_entity::{Column, Entity, Product};

/// `target LIKE 'value%'`
struct PrefixFilter;

impl Filter for PrefixFilter {
    fn key(&self) -> &str {
        "prefix"
    }

    fn apply(
        &self,
        query: &mut SelectStatement,
        table: &str,
        config: &FilterConfig,
        value: &Value,
    ) -> Result<(), FilterError> {
        let prefix = value.as_str().ok_or_else(|| {
            FilterError::invalid_value("prefix", &config.target_field, "expected a string")
        })?;
        query.and_where(
            Expr::col((Alias::new(table), Alias::new(&config.target_field)))
                .like(format!("{prefix}%")),
        );
        Ok(())
    }
}

fn filters(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn outcome_for<'a>(outcomes: &'a [FilterOutcome], field: &str) -> &'a FilterOutcome {
    outcomes
        .iter()
        .find(|outcome| outcome.field() == field)
        .unwrap_or_else(|| panic!("no outcome recorded for {field}"))
}

fn ids(rows: &[product_entity::Model]) -> Vec<i32> {
    rows.iter().map(|row| row.id).collect()
}

#[tokio::test]
async fn test_enum_filter_equality() {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    seed_catalog(&db).await;

    let orchestrator = QueryOrchestrator::for_model::<Product>();
    let (select, outcomes) =
        orchestrator.apply_filters(Entity::find(), &filters(json!({"status": "active"})));
    let rows = select.order_by_asc(Column::Id).all(&db).await.unwrap();

    assert_eq!(ids(&rows), vec![1, 3, 5]);
    assert!(matches!(
        outcome_for(&outcomes, "status"),
        FilterOutcome::Applied { predicates: 1, .. }
    ));
}

#[tokio::test]
async fn test_enum_filter_array_matches_any() {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    seed_catalog(&db).await;

    let orchestrator = QueryOrchestrator::for_model::<Product>();
    let (select, _) = orchestrator.apply_filters(
        Entity::find(),
        &filters(json!({"status": ["draft", "archived"]})),
    );
    let rows = select.order_by_asc(Column::Id).all(&db).await.unwrap();

    assert_eq!(ids(&rows), vec![2, 4]);
}

#[tokio::test]
async fn test_numeric_filter_on_foreign_key() {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    seed_catalog(&db).await;

    let orchestrator = QueryOrchestrator::for_model::<Product>();
    let (select, _) =
        orchestrator.apply_filters(Entity::find(), &filters(json!({"category_id": 1})));
    let rows = select.order_by_asc(Column::Id).all(&db).await.unwrap();

    assert_eq!(ids(&rows), vec![1, 2]);
}

#[tokio::test]
async fn test_unknown_field_is_skipped_and_known_field_applies() {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    seed_catalog(&db).await;

    let orchestrator = QueryOrchestrator::for_model::<Product>();
    let (select, outcomes) = orchestrator.apply_filters(
        Entity::find(),
        &filters(json!({"color": "red", "status": "draft"})),
    );
    let rows = select.all(&db).await.unwrap();

    assert_eq!(ids(&rows), vec![2]);
    assert_eq!(outcomes.len(), 2);
    assert!(matches!(
        outcome_for(&outcomes, "color"),
        FilterOutcome::Skipped {
            reason: SkipReason::UnknownField,
            ..
        }
    ));
    assert!(outcome_for(&outcomes, "status").is_applied());
}

#[tokio::test]
async fn test_empty_values_contribute_nothing() {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    seed_catalog(&db).await;

    let orchestrator = QueryOrchestrator::for_model::<Product>();
    let (select, outcomes) = orchestrator.apply_filters(
        Entity::find(),
        &filters(json!({"status": "  ", "category_id": [], "color": null})),
    );
    let rows = select.all(&db).await.unwrap();

    assert_eq!(rows.len(), 5);
    for outcome in &outcomes {
        assert!(
            matches!(
                outcome,
                FilterOutcome::Skipped {
                    reason: SkipReason::EmptyValue,
                    ..
                }
            ),
            "unexpected outcome {outcome:?}"
        );
    }
}

#[tokio::test]
async fn test_invalid_value_fails_without_aborting_batch() {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    seed_catalog(&db).await;

    let orchestrator = QueryOrchestrator::for_model::<Product>();
    let (select, outcomes) = orchestrator.apply_filters(
        Entity::find(),
        &filters(json!({"status": {"nested": true}, "category_id": 2})),
    );
    let rows = select.all(&db).await.unwrap();

    assert_eq!(ids(&rows), vec![3]);
    assert!(matches!(
        outcome_for(&outcomes, "status"),
        FilterOutcome::Failed {
            error: FilterError::InvalidValue { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_unregistered_kind_fails_and_names_the_key() {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    seed_catalog(&db).await;

    let metadata = EntityMetadata::builder("products")
        .table_fields(["id", "name", "status"])
        .filter("name", FilterConfig::new("fuzzy", "name"))
        .filter("status", FilterConfig::enumeration("status"))
        .build();
    let orchestrator = QueryOrchestrator::<Entity>::with_metadata(metadata);

    let err = orchestrator.ensure_filters_registered().unwrap_err();
    assert_eq!(
        err,
        RegistryError::NotFound {
            key: "fuzzy".to_string()
        }
    );

    let (select, outcomes) = orchestrator.apply_filters(
        Entity::find(),
        &filters(json!({"name": "Red", "status": "archived"})),
    );
    let rows = select.all(&db).await.unwrap();

    assert_eq!(ids(&rows), vec![4]);
    match outcome_for(&outcomes, "name") {
        FilterOutcome::Failed {
            error: FilterError::Registry(RegistryError::NotFound { key }),
            ..
        } => assert_eq!(key, "fuzzy"),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn test_custom_filter_kind_via_registry() {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    seed_catalog(&db).await;

    let registry = FilterRegistry::with_defaults();
    registry.register("prefix", PrefixFilter);

    let metadata = EntityMetadata::builder("products")
        .table_fields(["id", "name", "status"])
        .filter("name", FilterConfig::new("prefix", "name"))
        .filter("status", FilterConfig::enumeration("status"))
        .build();
    let orchestrator = QueryOrchestrator::<Entity>::with_metadata(metadata).with_registry(&registry);
    assert!(orchestrator.ensure_filters_registered().is_ok());

    let (select, outcomes) = orchestrator.apply_filters(
        Entity::find(),
        &filters(json!({"name": "Blue", "status": "draft"})),
    );
    let rows = select.all(&db).await.unwrap();

    assert_eq!(ids(&rows), vec![2]);
    assert!(outcomes.iter().all(FilterOutcome::is_applied));
}

#[tokio::test]
async fn test_field_with_several_descriptors_applies_each() {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    seed_catalog(&db).await;
    insert_product(&db, "Archive Box", None, "archived", None).await;

    let registry = FilterRegistry::with_defaults();
    registry.register("prefix", PrefixFilter);

    let metadata = EntityMetadata::builder("products")
        .table_fields(["id", "name", "status"])
        .filter("starts_with", FilterConfig::new("prefix", "name"))
        .filter("starts_with", FilterConfig::new("prefix", "status"))
        .build();
    let orchestrator = QueryOrchestrator::<Entity>::with_metadata(metadata).with_registry(&registry);

    let (select, outcomes) =
        orchestrator.apply_filters(Entity::find(), &filters(json!({"starts_with": "Ar"})));
    let rows = select.all(&db).await.unwrap();

    // Both predicates hold only for the new row; "Model 0 Lamp" is archived but not named "Ar..."
    assert_eq!(ids(&rows), vec![6]);
    assert!(matches!(
        outcome_for(&outcomes, "starts_with"),
        FilterOutcome::Applied { predicates: 2, .. }
    ));
}

#[test]
fn test_register_filters_macro_fills_global_registry() {
    listquery::register_filters!("starts_with_global" => PrefixFilter);

    let filter = FilterRegistry::global()
        .lookup("starts_with_global")
        .unwrap();
    assert_eq!(filter.key(), "prefix");
    assert!(FilterRegistry::global().contains("enum"));
}

#[tokio::test]
async fn test_failing_descriptor_discards_sibling_predicates() {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    seed_catalog(&db).await;

    let metadata = EntityMetadata::builder("products")
        .table_fields(["id", "name", "status"])
        .filter("status", FilterConfig::enumeration("status"))
        .filter("status", FilterConfig::new("fuzzy", "status"))
        .filter("category_id", FilterConfig::enumeration("category_id"))
        .build();
    let orchestrator = QueryOrchestrator::<Entity>::with_metadata(metadata);

    let (select, outcomes) = orchestrator.apply_filters(
        Entity::find(),
        &filters(json!({"status": "active", "category_id": 1})),
    );
    let rows = select.order_by_asc(Column::Id).all(&db).await.unwrap();

    // Only category_id narrows; the enum half of "status" must not leak through
    assert_eq!(ids(&rows), vec![1, 2]);
    assert!(matches!(
        outcome_for(&outcomes, "status"),
        FilterOutcome::Failed {
            error: FilterError::Registry(RegistryError::NotFound { .. }),
            ..
        }
    ));
    assert!(outcome_for(&outcomes, "category_id").is_applied());
}
