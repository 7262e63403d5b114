use axum::{
    Json,
    http::{HeaderMap, HeaderValue, header::CONTENT_RANGE},
    response::{IntoResponse, Response},
};
use sea_orm::{ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, Select};
use serde::Serialize;

use crate::errors::ApiError;

/// One page of results plus the counts needed to render a pager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<M> {
    pub items: Vec<M>,
    /// 1-based page number
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
    #[serde(skip)]
    resource: String,
}

impl<M> Page<M> {
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Zero-based offset of the first item on this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// Fetch page `page` (1-based) of `select`, `per_page` rows at a time.
///
/// `page == 0` is treated as the first page and `per_page` is clamped to
/// `1..=max_per_page`. The count runs against the same filtered query, so
/// `total_items` is the size of the unpaginated result.
///
/// # Errors
///
/// Returns [`ApiError::Database`] when the count or fetch query fails.
pub async fn paginate<E, M, C>(
    select: Select<E>,
    db: &C,
    page: u64,
    per_page: u64,
    max_per_page: u64,
) -> Result<Page<M>, ApiError>
where
    E: EntityTrait,
    M: FromQueryResult + Sized + Send + Sync,
    C: ConnectionTrait,
{
    let page = page.max(1);
    let per_page = per_page.clamp(1, max_per_page.max(1));
    let resource = E::default().table_name().to_string();

    let paginator = select.into_model::<M>().paginate(db, per_page);
    let counts = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(Page {
        items,
        page,
        per_page,
        total_items: counts.number_of_items,
        total_pages: counts.number_of_pages,
        resource,
    })
}

/// Sanitize resource name by removing control characters for HTTP headers
fn sanitize_resource_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

/// Function to calculate the total count and generate the Content-Range header.
///
/// # Arguments
///
/// * `offset` - The starting point of the range.
/// * `limit` - The maximum number of items to include in the range.
/// * `total_count` - The total number of items available.
/// * `resource_name` - The name of the resource being paginated.
///
/// The range end is inclusive and never passes the last item. A range that
/// holds no items (empty result or a page past the end) is reported as
/// `resource */total`. If the resource name contains invalid header
/// characters, it is sanitized.
#[must_use]
pub fn calculate_content_range(
    offset: u64,
    limit: u64,
    total_count: u64,
    resource_name: &str,
) -> HeaderMap {
    let safe_name = sanitize_resource_name(resource_name);
    let range = if limit == 0 || offset >= total_count {
        format!("*/{total_count}")
    } else {
        let last = offset
            .saturating_add(limit - 1)
            .min(total_count - 1);
        format!("{offset}-{last}/{total_count}")
    };

    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("{safe_name} {range}")).unwrap_or_else(|_| {
        HeaderValue::from_str(&format!("items {range}"))
            .unwrap_or_else(|_| HeaderValue::from_static("items */0"))
    });
    headers.insert(CONTENT_RANGE, value);
    headers
}

impl<M: Serialize> IntoResponse for Page<M> {
    fn into_response(self) -> Response {
        let headers = calculate_content_range(
            self.offset(),
            self.per_page,
            self.total_items,
            &self.resource,
        );
        (headers, Json(self)).into_response()
    }
}
