//! # Pagination
//!
//! Offset pagination shared by every list endpoint.
//!
//! ```text
//! GET /students?skip=40&limit=20
//!
//!   rows:  0 ..... 39 │ 40 ....... 59 │ 60 ...
//!                     └─── page 3 ────┘
//!
//!   page = skip / limit + 1 = 3      per_page = limit = 20
//! ```
//!
//! `total` is always the number of matching rows before `skip`/`limit` are
//! applied.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

// =============================================================================
// Page Request
// =============================================================================

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

/// The `skip` / `limit` pair of a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Creates a validated page request.
    pub fn new(skip: i64, limit: i64) -> Result<Self, ValidationError> {
        let request = PageRequest { skip, limit };
        request.validate()?;
        Ok(request)
    }

    /// Builds the request for a 1-based page number.
    ///
    /// Page numbers below 1 are treated as page 1. `skip` saturates at
    /// `i64::MAX`, which simply yields an empty page.
    pub fn for_page(page: i64, per_page: i64) -> Self {
        let page = page.max(1);
        PageRequest {
            skip: (page - 1).saturating_mul(per_page),
            limit: per_page,
        }
    }

    /// Checks `skip >= 0` and `1 <= limit <= 1000`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.skip < 0 {
            return Err(ValidationError::OutOfRange {
                field: "skip".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        if self.limit < 1 || self.limit > MAX_PAGE_LIMIT {
            return Err(ValidationError::OutOfRange {
                field: "limit".to_string(),
                min: 1,
                max: MAX_PAGE_LIMIT,
            });
        }
        Ok(())
    }

    /// 1-based page number, `skip / limit + 1`.
    #[inline]
    pub fn page(&self) -> i64 {
        self.skip / self.limit + 1
    }
}

// =============================================================================
// Page Envelope
// =============================================================================

/// One page of results: `{items, total, page, per_page}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T> Page<T> {
    /// Wraps the rows fetched for `request` together with the unpaginated total.
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Page {
            items,
            total,
            page: request.page(),
            per_page: request.limit,
        }
    }

    /// Number of pages, rounded up. Zero when there are no rows.
    pub fn total_pages(&self) -> i64 {
        if self.per_page <= 0 {
            return 0;
        }
        (self.total + self.per_page - 1) / self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.page.saturating_mul(self.per_page) < self.total
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Converts every item, keeping the counters.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
