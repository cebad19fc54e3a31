//! Cursor-based pagination for GitHub GraphQL connections.
//!
//! GraphQL connections page with opaque cursors rather than page numbers. A
//! [`PageCursor`] can only be handed back to the API, never compared or
//! ordered.

use std::fmt;

use super::error::ApiError;

/// Largest page GitHub allows for a GraphQL connection.
pub const MAX_PAGE_SIZE: u8 = 100;

/// Page size used when the caller does not choose one.
pub const DEFAULT_PAGE_SIZE: u8 = 20;

/// Opaque position marker returned by a GraphQL connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(String);

impl PageCursor {
    /// Wraps a cursor string returned by GitHub.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw cursor value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Number of nodes requested per page, validated against GitHub's limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(u8);

impl PageSize {
    /// Validates a page size.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when `value` is zero or larger than
    /// [`MAX_PAGE_SIZE`].
    pub fn new(value: u8) -> Result<Self, ApiError> {
        if value == 0 || value > MAX_PAGE_SIZE {
            return Err(ApiError::Validation {
                message: format!("page size must be between 1 and {MAX_PAGE_SIZE}, got {value}"),
            });
        }
        Ok(Self(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

/// Parameters for fetching one page of a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Nodes per page.
    pub page_size: PageSize,
    /// Cursor to resume after; `None` requests the first page.
    pub after: Option<PageCursor>,
}

impl PageRequest {
    /// Requests the first page.
    #[must_use]
    pub const fn first(page_size: PageSize) -> Self {
        Self {
            page_size,
            after: None,
        }
    }

    /// Requests the page following `cursor`.
    #[must_use]
    pub const fn after(page_size: PageSize, cursor: PageCursor) -> Self {
        Self {
            page_size,
            after: Some(cursor),
        }
    }
}

/// Navigation state of a fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Cursor of the last node on the page.
    pub end_cursor: Option<PageCursor>,
    /// Whether more nodes exist after `end_cursor`.
    pub has_next: bool,
}

impl PageInfo {
    /// Returns the cursor to continue from, if another page exists.
    ///
    /// A connection that claims another page but returns no cursor cannot be
    /// continued, so this yields `None` in that case.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&PageCursor> {
        if self.has_next {
            self.end_cursor.as_ref()
        } else {
            None
        }
    }
}

/// One page of a GraphQL connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Nodes on this page, in the order GitHub returned them.
    pub items: Vec<T>,
    /// Navigation state for the next request.
    pub page_info: PageInfo,
    /// Total nodes in the connection across all pages.
    pub total_count: u64,
}
