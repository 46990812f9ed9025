//! Page-number pagination primitives shared by forum listing endpoints.
//!
//! Listings resolve a user supplied `page` parameter against a total count and
//! a fixed page size. Resolution never fails: an unparsable page selects the
//! first page and a page past the end is clamped to the last page, so callers
//! always receive a renderable [`Page`].
//!
//! ```
//! use pagination::{PageRequest, PageSize};
//!
//! let size = PageSize::new(20).expect("non-zero page size");
//! let window = PageRequest::parse(Some("7")).window(45, size);
//! assert_eq!(window.number(), 3);
//! assert_eq!(window.offset(), 40);
//! ```

mod page;
mod request;

pub use page::Page;
pub use request::{PageRequest, PageSize, PageWindow, PaginationError};
