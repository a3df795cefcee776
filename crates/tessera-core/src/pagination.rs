//! Offset-based pagination types for list operations.

use serde::{Deserialize, Serialize};

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// A request for a window of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    /// Index of the first item to return.
    pub offset: usize,
    /// Maximum number of items to return.
    pub page_size: usize,
}

impl PageWindow {
    /// Creates a window, falling back to offset 0 and [`DEFAULT_PAGE_SIZE`]
    /// for missing values.
    #[must_use]
    pub fn new(offset: Option<usize>, page_size: Option<usize>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    /// Creates a window from explicit values.
    #[must_use]
    pub const fn at(offset: usize, page_size: usize) -> Self {
        Self { offset, page_size }
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A window of results plus the total number of items available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// The items in this window, at most `page_size` long.
    pub items: Vec<T>,
    /// Total number of items across all windows.
    pub total_count: usize,
    /// Offset this window was requested at.
    pub offset: usize,
    /// Page size this window was requested with.
    pub page_size: usize,
}

impl<T> PagedResult<T> {
    /// Creates a new paged result.
    #[must_use]
    pub fn new(items: Vec<T>, total_count: usize, window: PageWindow) -> Self {
        Self {
            items,
            total_count,
            offset: window.offset,
            page_size: window.page_size,
        }
    }

    /// Creates an empty result reporting no items at all.
    #[must_use]
    pub fn empty(window: PageWindow) -> Self {
        Self::new(Vec::new(), 0, window)
    }

    /// Offset to request for the following page.
    #[must_use]
    pub fn next_offset(&self) -> usize {
        self.offset + self.items.len()
    }

    /// Window to request for the following page.
    #[must_use]
    pub fn next_window(&self) -> PageWindow {
        PageWindow::at(self.next_offset(), self.page_size)
    }

    /// Returns true if items remain past this window.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_offset() < self.total_count
    }

    /// Maps the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            offset: self.offset,
            page_size: self.page_size,
        }
    }

    /// Returns true if the window holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items in this window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> IntoIterator for PagedResult<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
