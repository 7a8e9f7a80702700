use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Highest page whose offset still fits in an `i64`.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let limit = match limit {
            Some(value) if value > 0 => value.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };
        let page = match page {
            Some(value) if value > 0 => value.min(MAX_PAGE),
            _ => 1,
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let total_pages = if total <= 0 {
            0
        } else {
            (total + request.limit - 1) / request.limit
        };
        Self {
            items,
            pagination: Pagination {
                page: request.page,
                limit: request.limit,
                total,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = PageRequest::default();
        assert_eq!(request.page, 1);
        assert_eq!(request.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_clamps_out_of_range_values() {
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest::new(None, None));
        assert_eq!(PageRequest::new(Some(-3), Some(500)).limit, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let request = PageRequest::new(Some(i64::MAX), Some(MAX_PAGE_SIZE));
        assert_eq!(request.page, MAX_PAGE);
        assert!(request.offset() > 0);
        assert_eq!(request.offset(), (MAX_PAGE - 1) * MAX_PAGE_SIZE);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page: Page<i32> = Page::new(vec![], PageRequest::new(Some(1), Some(12)), 25);
        assert_eq!(page.pagination.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], PageRequest::default(), 0);
        assert_eq!(empty.pagination.total_pages, 0);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pagination"]["totalPages"], 3);
    }
}
