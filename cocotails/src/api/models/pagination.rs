//! Shared pagination types for API query parameters.
//!
//! List endpoints use page-number pagination: `page` (1-based) and `per_page`.
//! Each endpoint picks its own default and maximum page size, so the query type
//! only carries what the client sent and [`PageParams::window`] applies the
//! endpoint's bounds.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Page-number pagination parameters.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageParams {
    /// 1-based page number (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<i64>,

    /// Items per page (default and maximum depend on the endpoint)
    #[param(minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub per_page: Option<i64>,
}

/// The resolved page after defaults and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
}

impl PageParams {
    /// Resolve the page, clamping `per_page` to `1..=max` and defaulting it to `default`.
    #[inline]
    pub fn window(&self, default: i64, max: i64) -> PageWindow {
        PageWindow {
            page: self.page.unwrap_or(1).max(1),
            per_page: self.per_page.unwrap_or(default).clamp(1, max),
        }
    }
}

impl PageWindow {
    /// Rows to skip before this page.
    #[inline]
    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Number of pages needed for `total` rows (0 when there are none).
    #[inline]
    pub fn pages(&self, total: i64) -> i64 {
        (total + self.per_page - 1) / self.per_page
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    pub page: i64,
    pub per_page: i64,
    /// Total number of items matching the query
    pub total: i64,
    pub pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(window: PageWindow, total: i64) -> Self {
        let pages = window.pages(total);
        Self {
            page: window.page,
            per_page: window.per_page,
            total,
            pages,
            has_next: window.page < pages,
            has_prev: window.page > 1,
        }
    }
}
