//! Pagination utilities for service layer
//!
//! `limit`/`offset` inputs are validated and clamped; list results carry a
//! `PaginationMeta` with the total row count.

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Hard upper bound for any page.
pub const MAX_LIMIT: u64 = 100;
/// Default page size for admin listings.
pub const ADMIN_DEFAULT_LIMIT: u64 = 50;
/// Default page size for the public catalog.
pub const PUBLIC_DEFAULT_LIMIT: u64 = 100;

/// Raw pagination parameters as received from a query string.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Validated page window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Pagination {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self { Self { limit, offset } }

    /// Reject negatives, clamp the limit to `1..=MAX_LIMIT`.
    pub fn normalize(self, default_limit: u64) -> Result<Page, ServiceError> {
        let limit = match self.limit {
            None => default_limit,
            Some(l) if l < 0 => return Err(ServiceError::validation("limit must be >= 0")),
            Some(0) => default_limit,
            Some(l) => l as u64,
        };
        let offset = match self.offset {
            None => 0,
            Some(o) if o < 0 => return Err(ServiceError::validation("offset must be >= 0")),
            Some(o) => o as u64,
        };
        Ok(Page { limit: limit.clamp(1, MAX_LIMIT), offset })
    }
}

impl Page {
    pub fn meta(&self, total: u64) -> PaginationMeta {
        PaginationMeta {
            total,
            limit: self.limit,
            offset: self.offset,
            has_more: self.offset + self.limit < total,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub has_more: bool,
}

/// A page of results plus its metadata.
#[derive(Clone, Debug, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_defaults_when_absent() {
        let p = Pagination::default().normalize(ADMIN_DEFAULT_LIMIT).unwrap();
        assert_eq!(p, Page { limit: 50, offset: 0 });
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let p = Pagination::new(Some(1000), Some(20)).normalize(ADMIN_DEFAULT_LIMIT).unwrap();
        assert_eq!(p.limit, 100);
        assert_eq!(p.offset, 20);
    }

    #[test]
    fn normalize_rejects_negative() {
        assert!(Pagination::new(Some(-1), None).normalize(50).is_err());
        assert!(Pagination::new(None, Some(-5)).normalize(50).is_err());
    }

    #[test]
    fn has_more_is_strict() {
        let page = Page { limit: 10, offset: 20 };
        assert!(page.meta(31).has_more);
        assert!(!page.meta(30).has_more);
        assert_eq!(serde_json::to_value(page.meta(30)).unwrap()["hasMore"], serde_json::json!(false));
    }
}
