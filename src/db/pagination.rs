use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, Select};
use serde::Serialize;

use crate::constants::pagination::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE};

/// A 1-based page request with the page size clamped to `1..=MAX_PER_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Page numbers below 1 become 1; page sizes below 1 are floored to 1.
    #[must_use]
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        let page = page.map_or(DEFAULT_PAGE, |p| u64::try_from(p.max(1)).unwrap_or(1));
        let per_page = per_page.map_or(DEFAULT_PER_PAGE, |p| {
            u64::try_from(p.max(1)).unwrap_or(1).min(MAX_PER_PAGE)
        });
        Self { page, per_page }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    #[must_use]
    pub const fn new(request: PageRequest, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(request.per_page);
        Self {
            page: request.page,
            per_page: request.per_page,
            total_pages,
            total_items,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

/// Runs a composed query for one page. Pages past the end come back empty.
pub async fn paginate<E, C>(
    select: Select<E>,
    conn: &C,
    request: PageRequest,
) -> Result<Page<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let paginator = select.paginate(conn, request.per_page);
    let total_items = paginator.num_items().await?;
    let meta = PageMeta::new(request, total_items);

    let items = if request.page > meta.total_pages {
        Vec::new()
    } else {
        paginator.fetch_page(request.page - 1).await?
    };

    Ok(Page { items, meta })
}
