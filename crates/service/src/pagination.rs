//! Pagination utilities for service layer
//!
//! `page` is 1-based on the wire; sea-orm paginators are 0-based.

use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Select};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Pagination parameters, usually deserialized from the query string.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Pagination {
    /// 1-based page index
    #[serde(default = "default_page")]
    pub page: u64,
    /// items per page
    #[serde(default = "default_size")]
    pub size: u64,
}

fn default_page() -> u64 { 1 }
fn default_size() -> u64 { DEFAULT_PAGE_SIZE }

impl Pagination {
    pub fn new(page: u64, size: u64) -> Self {
        Self { page, size }
    }

    /// Clamp to sane bounds and return `(page, size)` with page still 1-based.
    pub fn normalize(self) -> (u64, u64) {
        (self.page.max(1), self.size.clamp(1, MAX_PAGE_SIZE))
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, size: DEFAULT_PAGE_SIZE } }
}

/// One page of results plus totals.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total_items: u64) -> Self {
        let (page, size) = pagination.normalize();
        Self { items, page, size, total_items, total_pages: total_items.div_ceil(size) }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Runs `select` as a paginated query. The caller is responsible for a stable ordering.
pub async fn fetch_page<'db, E>(
    db: &'db DatabaseConnection,
    select: Select<E>,
    pagination: Pagination,
) -> Result<Page<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Send + Sync + 'db,
{
    let (page, size) = pagination.normalize();
    let paginator = select.paginate(db, size);
    let total = paginator.num_items().await?;
    // Pages past the end, including offsets that overflow, are empty.
    let in_range = (page - 1).checked_mul(size).is_some_and(|offset| offset < total && offset <= i64::MAX as u64);
    let items = if in_range { paginator.fetch_page(page - 1).await? } else { Vec::new() };
    Ok(Page::new(items, pagination, total))
}
