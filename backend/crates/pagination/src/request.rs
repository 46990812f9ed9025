//! Page request parsing and window resolution.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors raised when constructing pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// A page must hold at least one item.
    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

/// Number of items rendered per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageSize(NonZeroU32);

impl PageSize {
    /// Validate and wrap a page size.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::ZeroPageSize`] when `value` is zero.
    pub const fn new(value: u32) -> Result<Self, PaginationError> {
        match NonZeroU32::new(value) {
            Some(size) => Ok(Self(size)),
            None => Err(PaginationError::ZeroPageSize),
        }
    }

    /// Page size as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for PageSize {
    type Error = PaginationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageSize> for u32 {
    fn from(value: PageSize) -> Self {
        value.get()
    }
}

/// One-based page number requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

impl PageRequest {
    /// Request the first page.
    #[must_use]
    pub const fn first() -> Self {
        Self { page: 1 }
    }

    /// Request a specific page; zero is treated as the first page.
    #[must_use]
    pub const fn number(page: u64) -> Self {
        if page == 0 {
            Self::first()
        } else {
            Self { page }
        }
    }

    /// Parse a raw `page` query parameter.
    ///
    /// Missing, blank, non-numeric and zero values select the first page.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(Self::first, Self::number)
    }

    /// Requested page number before clamping.
    #[must_use]
    pub const fn requested(self) -> u64 {
        self.page
    }

    /// Resolve the request against a collection of `total` items.
    ///
    /// The resulting page number is clamped to `1..=num_pages`. An empty
    /// collection still has a single (empty) page.
    #[must_use]
    pub fn window(self, total: u64, size: PageSize) -> PageWindow {
        let per_page = u64::from(size.get());
        let num_pages = total.div_ceil(per_page).max(1);
        let number = self.page.clamp(1, num_pages);
        PageWindow {
            number,
            per_page,
            num_pages,
            total,
        }
    }
}

/// A resolved page: its clamped number plus the slice bounds to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    number: u64,
    per_page: u64,
    num_pages: u64,
    total: u64,
}

impl PageWindow {
    /// Clamped one-based page number.
    #[must_use]
    pub const fn number(self) -> u64 {
        self.number
    }

    /// Number of items to skip.
    #[must_use]
    pub const fn offset(self) -> u64 {
        (self.number - 1).saturating_mul(self.per_page)
    }

    /// Maximum number of items on the page.
    #[must_use]
    pub const fn limit(self) -> u64 {
        self.per_page
    }

    /// Total number of pages, never less than one.
    #[must_use]
    pub const fn num_pages(self) -> u64 {
        self.num_pages
    }

    /// Total number of items across all pages.
    #[must_use]
    pub const fn total(self) -> u64 {
        self.total
    }

    /// Whether a page follows this one.
    #[must_use]
    pub const fn has_next(self) -> bool {
        self.number < self.num_pages
    }

    /// Whether a page precedes this one.
    #[must_use]
    pub const fn has_previous(self) -> bool {
        self.number > 1
    }
}
