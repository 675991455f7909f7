//! Pagination query parameters.

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

use crate::domain::repositories::Pagination;
use crate::error::AppError;

/// Page-size bounds configured outside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 25,
            max_limit: 100,
        }
    }
}

/// Pagination query parameters.
///
/// Uses `serde_with` to parse page numbers from query strings as integers.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PaginationParams {
    /// Applies defaults and validates against the configured bounds.
    ///
    /// # Defaults
    ///
    /// - `page`: 1
    /// - `limit`: `limits.default_limit`
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `page` is 0 or `limit` is outside
    /// `1..=limits.max_limit`.
    pub fn resolve(&self, limits: PageLimits) -> Result<Pagination, AppError> {
        Pagination::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(limits.default_limit),
            limits.max_limit,
        )
    }
}
