use sea_orm::{Condition, EntityTrait, QueryFilter, Select};

use super::filter::qualified;

/// Longest search term, in characters, that reaches the database.
pub const MAX_SEARCH_TERM_LENGTH: usize = 10_000;

/// Trim `term` and cap it at [`MAX_SEARCH_TERM_LENGTH`] characters.
///
/// Returns `None` when nothing searchable remains.
#[must_use]
pub fn normalize_term(term: &str) -> Option<&str> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return None;
    }
    let end = trimmed
        .char_indices()
        .nth(MAX_SEARCH_TERM_LENGTH)
        .map_or(trimmed.len(), |(idx, _)| idx);
    Some(trimmed[..end].trim_end())
}

/// Add a grouped `(f1 LIKE '%term%' OR f2 LIKE '%term%' ...)` clause.
///
/// The group is ANDed with whatever predicates `select` already carries. A
/// blank term or an empty field list leaves `select` unchanged.
///
/// Matching follows the database's `LIKE` (SQLite and MySQL compare ASCII
/// case-insensitively, Postgres does not). The term is passed through as is,
/// so `%` and `_` inside it behave as wildcards.
pub fn apply_search<E, S>(select: Select<E>, table: &str, term: &str, fields: &[S]) -> Select<E>
where
    E: EntityTrait,
    S: AsRef<str>,
{
    let Some(term) = normalize_term(term) else {
        return select;
    };
    if fields.is_empty() {
        return select;
    }

    let pattern = format!("%{term}%");
    let condition = fields.iter().fold(Condition::any(), |condition, field| {
        condition.add(qualified(table, field.as_ref()).like(pattern.as_str()))
    });
    select.filter(condition)
}
