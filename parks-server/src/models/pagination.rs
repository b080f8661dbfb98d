//! Page/offset pagination for park, review and sighting listings

use serde::{Deserialize, Serialize};

const MAX_PER_PAGE: u32 = 100;
const DEFAULT_PER_PAGE: u32 = 20;

/// Clamped page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number (1-indexed)
    pub page: u32,
    /// Items per page (1..=100)
    pub per_page: u32,
}

impl Pagination {
    /// Page is clamped to at least 1, per_page to 1..=100.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// One page of results plus the total across all pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: Pagination) -> Self {
        Self {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        }
    }

    /// Convert items while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn total_pages(&self) -> u32 {
        if self.total <= 0 {
            return 1;
        }
        let total = self.total as u64;
        let per_page = u64::from(self.per_page);
        total.div_ceil(per_page).max(1) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// `?page=&per_page=` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<PaginationParams> for Pagination {
    fn from(params: PaginationParams) -> Self {
        Self::new(
            params.page.unwrap_or(1),
            params.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_calculation() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(2, 10).offset(), 10);
        assert_eq!(Pagination::new(3, 25).offset(), 50);
    }

    #[test]
    fn clamps_inputs() {
        assert_eq!(Pagination::new(0, 10).page, 1);
        assert_eq!(Pagination::new(1, 0).per_page, 1);
        assert_eq!(Pagination::new(1, 999).per_page, 100);
    }

    #[test]
    fn defaults_from_empty_params() {
        let page = Pagination::from(PaginationParams::default());
        assert_eq!(page, Pagination::new(1, 20));
    }

    #[test]
    fn total_pages_and_next() {
        let page: Paginated<()> = Paginated::new(vec![], 0, Pagination::new(1, 10));
        assert_eq!(page.total_pages(), 1);
        assert!(!page.has_next());

        let page: Paginated<()> = Paginated::new(vec![], 25, Pagination::new(2, 10));
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
    }

    #[test]
    fn map_keeps_metadata() {
        let page = Paginated::new(vec![1, 2], 12, Pagination::new(2, 2)).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total, 12);
        assert_eq!(page.page, 2);
    }
}
