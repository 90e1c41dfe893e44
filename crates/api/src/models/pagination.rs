//! Page/limit query parameters for list endpoints.

use serde::Deserialize;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;

/// Pagination requested by the caller.
///
/// Both values default when absent (`page=1`, `limit=10`). No upper bound is
/// enforced on `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

const fn default_page() -> u32 {
    DEFAULT_PAGE
}

const fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Create a pagination value.
    #[must_use]
    pub const fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Number of rows to skip. Page `0` is treated as page `1`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)).saturating_mul(i64::from(self.limit))
    }

    /// Number of rows to return.
    #[must_use]
    pub fn row_limit(&self) -> i64 {
        i64::from(self.limit)
    }
}
