//! Shared Data Transfer Objects (DTOs) for API handlers.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::services::customer_service::clamp_page;

/// Pagination metadata for list responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Number of items per page
    pub page_size: i64,
    /// Total number of items across all pages
    pub total: i64,
    /// Total number of pages
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + page_size - 1) / page_size
        };

        Self {
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

/// Query parameters for paginated list requests.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Requested page number (default: 1)
    pub page: Option<i64>,
    /// Requested items per page (default: 20, max: 100)
    pub page_size: Option<i64>,
}

impl PaginationQuery {
    /// Effective `(page, page_size)` after defaults and clamping.
    pub fn resolve(&self) -> (i64, i64) {
        clamp_page(self.page, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 20, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 20, 20).total_pages, 1);
        assert_eq!(Pagination::new(1, 20, 21).total_pages, 2);
    }

    #[test]
    fn test_query_defaults_and_clamping() {
        assert_eq!(PaginationQuery::default().resolve(), (1, 20));
        let query = PaginationQuery {
            page: Some(0),
            page_size: Some(5000),
        };
        assert_eq!(query.resolve(), (1, 100));
    }
}
