//! Serializable page envelope returned by listing endpoints.

use serde::Serialize;

use crate::PageWindow;

/// One page of items together with navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    number: u64,
    per_page: u64,
    num_pages: u64,
    total_count: u64,
    has_next: bool,
    has_previous: bool,
}

impl<T> Page<T> {
    /// Assemble a page from fetched items and the window they were fetched for.
    #[must_use]
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number(),
            per_page: window.limit(),
            num_pages: window.num_pages(),
            total_count: window.total(),
            has_next: window.has_next(),
            has_previous: window.has_previous(),
        }
    }

    /// Items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consume the page and return its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// One-based page number.
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }

    /// Total number of pages.
    #[must_use]
    pub const fn num_pages(&self) -> u64 {
        self.num_pages
    }

    /// Total number of items across all pages.
    #[must_use]
    pub const fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Whether a page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.has_next
    }

    /// Whether a page precedes this one.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.has_previous
    }

    /// Transform every item while keeping the navigation metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            num_pages: self.num_pages,
            total_count: self.total_count,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PageRequest, PageSize};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn serializes_navigation_in_camel_case() {
        let size = PageSize::new(2).expect("valid size");
        let window = PageRequest::number(2).window(5, size);
        let page = Page::new(vec!["c", "d"], window);

        let value = serde_json::to_value(&page).expect("serialize page");
        assert_eq!(
            value,
            json!({
                "items": ["c", "d"],
                "number": 2,
                "perPage": 2,
                "numPages": 3,
                "totalCount": 5,
                "hasNext": true,
                "hasPrevious": true,
            })
        );
    }

    #[rstest]
    fn map_preserves_metadata() {
        let size = PageSize::new(3).expect("valid size");
        let page = Page::new(vec![1, 2, 3], PageRequest::first().window(4, size));
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items(), &[10, 20, 30]);
        assert_eq!(mapped.num_pages(), 2);
        assert!(mapped.has_next());
    }
}
