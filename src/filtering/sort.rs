use sea_orm::{
    EntityTrait, QueryOrder, Select,
    sea_query::{Expr, Order, SimpleExpr, Value},
};

use uuid::Uuid;

use super::filter::qualified;
use crate::metadata::{EntityMetadata, IdKind, SortDefaults};

/// Convert sort order string to Order enum
#[must_use]
pub fn parse_order(sort_order: &str) -> Order {
    if sort_order.trim().eq_ignore_ascii_case("ASC") {
        Order::Asc
    } else {
        Order::Desc
    }
}

/// Resolve the column and direction to sort by.
///
/// A requested key is honoured only when it names a known column; otherwise
/// the defaults apply. A requested direction applies to whichever column wins.
#[must_use]
pub fn resolve_sort(
    metadata: &EntityMetadata,
    sort_key: Option<&str>,
    sort_dir: Option<&str>,
) -> SortDefaults {
    let defaults = &metadata.default_sort;
    let field = match sort_key.map(str::trim).filter(|key| !key.is_empty()) {
        Some(key) if metadata.has_field(key) => key.to_string(),
        Some(key) => {
            tracing::debug!(
                sort_key = %key,
                fallback = %defaults.field,
                "Unknown sort key, using default"
            );
            defaults.field.clone()
        }
        None => defaults.field.clone(),
    };
    let direction = sort_dir
        .filter(|dir| !dir.trim().is_empty())
        .map_or_else(|| defaults.direction.clone(), parse_order);

    SortDefaults { field, direction }
}

/// Order rows whose `id_field` is in `selected_ids` ahead of everything else.
///
/// Ids bind according to `id_kind`; ids that do not fit the column type are
/// dropped rather than sent to the database.
pub fn selected_first<E, S>(
    select: Select<E>,
    table: &str,
    id_field: &str,
    id_kind: IdKind,
    selected_ids: &[S],
) -> Select<E>
where
    E: EntityTrait,
    S: AsRef<str>,
{
    let ids: Vec<Value> = selected_ids
        .iter()
        .filter_map(|id| bind_id(id.as_ref(), id_kind))
        .collect();
    if ids.is_empty() {
        return select;
    }

    let rank = SimpleExpr::Case(Box::new(
        Expr::case(qualified(table, id_field).is_in(ids), 0).finally(1),
    ));
    select.order_by(rank, Order::Asc)
}

fn bind_id(id: &str, id_kind: IdKind) -> Option<Value> {
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    match id_kind {
        IdKind::Integer => id.parse::<i64>().ok().map(Value::from),
        IdKind::Uuid => Uuid::parse_str(id).ok().map(Value::from),
        IdKind::Text => Some(Value::from(id.to_string())),
    }
}

/// Append `ORDER BY "table"."field" direction`.
pub fn apply_order<E: EntityTrait>(select: Select<E>, table: &str, sort: &SortDefaults) -> Select<E> {
    select.order_by(
        SimpleExpr::from(qualified(table, &sort.field)),
        sort.direction.clone(),
    )
}
