use sea_orm::sea_query::{Alias, Expr, SelectStatement, SimpleExpr, Value};
use uuid::Uuid;

use crate::errors::FilterError;
use crate::metadata::{FilterConfig, FilterOption};
use crate::models::humanize;

/// A stateless unit turning one `(descriptor, value)` pair into a predicate.
///
/// Implementations are registered once in a
/// [`FilterRegistry`](super::FilterRegistry) and shared across requests, so
/// they must not hold per-request data.
pub trait Filter: Send + Sync {
    /// Registry key this capability is known by.
    fn key(&self) -> &str;

    /// Append this filter's predicate for `value` to `query`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidValue`] when `value` has a shape this
    /// filter cannot express. `query` is left untouched in that case.
    fn apply(
        &self,
        query: &mut SelectStatement,
        table: &str,
        config: &FilterConfig,
        value: &serde_json::Value,
    ) -> Result<(), FilterError>;

    fn label(&self, config: &FilterConfig) -> String {
        config
            .label
            .clone()
            .unwrap_or_else(|| humanize(&config.target_field))
    }

    fn options(&self, config: &FilterConfig) -> Vec<FilterOption> {
        config.options.clone()
    }
}

/// Table-qualified column expression, unambiguous once relations are joined.
pub(crate) fn qualified(table: &str, field: &str) -> Expr {
    Expr::col((Alias::new(table), Alias::new(field)))
}

/// Equality filter for enumerated columns such as `status` or `type`.
///
/// A scalar value yields `target = value`; an array yields `target IN (...)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnumFilter;

impl EnumFilter {
    pub const KEY: &'static str = "enum";
}

impl Filter for EnumFilter {
    fn key(&self) -> &str {
        Self::KEY
    }

    fn apply(
        &self,
        query: &mut SelectStatement,
        table: &str,
        config: &FilterConfig,
        value: &serde_json::Value,
    ) -> Result<(), FilterError> {
        let invalid = |reason: &str| FilterError::invalid_value(Self::KEY, &config.target_field, reason);
        let column = qualified(table, &config.target_field);

        let predicate: SimpleExpr = if let serde_json::Value::Array(items) = value {
            let values = items
                .iter()
                .map(scalar_value)
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| invalid("arrays may only hold strings, numbers or booleans"))?;
            if values.is_empty() {
                return Err(invalid("empty array"));
            }
            column.is_in(values)
        } else {
            let value = scalar_value(value)
                .ok_or_else(|| invalid("expected a string, number, boolean or array"))?;
            column.eq(value)
        };

        query.and_where(predicate);
        Ok(())
    }
}

/// Convert a JSON scalar into a bindable value.
///
/// Strings are trimmed and UUID-shaped strings bind as UUIDs. Returns `None`
/// for null, objects, arrays and blank strings.
pub(crate) fn scalar_value(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else if let Ok(uuid) = Uuid::parse_str(trimmed) {
                Some(Value::from(uuid))
            } else {
                Some(Value::from(trimmed.to_string()))
            }
        }
        serde_json::Value::Number(number) => number
            .as_i64()
            .map(Value::from)
            .or_else(|| number.as_f64().map(Value::from)),
        serde_json::Value::Bool(b) => Some(Value::from(*b)),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}
