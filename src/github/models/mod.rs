//! Data models for discussions, comments, and their authors.
//!
//! Public types here are the domain view handed to callers. The GraphQL
//! deserialisation targets live in the private `api` module and convert into
//! these types.

use std::fmt;

use chrono::{DateTime, Utc};

pub(crate) mod api;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Opaque, stable GraphQL node id of a discussion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscussionId(String);

impl DiscussionId {
    /// Wraps a node id returned by GitHub.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DiscussionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Opaque GraphQL node id of a discussion comment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommentId(String);

impl CommentId {
    /// Wraps a node id returned by GitHub.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Account that wrote a discussion or comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Login name.
    pub login: String,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Profile URL.
    pub url: Option<String>,
}

/// Category a discussion is filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscussionCategory {
    /// Category node id.
    pub id: String,
    /// Display name, matched case-insensitively when creating discussions.
    pub name: String,
    /// Emoji shortcode shown next to the name.
    pub emoji: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
}

/// Lifecycle state of a discussion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscussionState {
    /// Accepting comments.
    #[default]
    Open,
    /// Closed by a maintainer or the author.
    Closed,
    /// Locked against new comments.
    Locked,
}

impl DiscussionState {
    /// Derives the state from GitHub's `closed` and `locked` flags; a lock
    /// takes precedence over closure.
    #[must_use]
    pub const fn from_flags(closed: bool, locked: bool) -> Self {
        if locked {
            Self::Locked
        } else if closed {
            Self::Closed
        } else {
            Self::Open
        }
    }

    /// Lowercase label for display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Locked => "locked",
        }
    }
}

impl fmt::Display for DiscussionState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A top-level discussion thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discussion {
    /// Stable identity key.
    pub id: DiscussionId,
    /// Human-facing number, unique within the repository.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Markdown body, if any.
    pub body: Option<String>,
    /// Author; `None` for deleted accounts.
    pub author: Option<Author>,
    /// Category.
    pub category: DiscussionCategory,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time; the remote list is sorted by this, newest first.
    pub updated_at: DateTime<Utc>,
    /// Number of top-level comments.
    pub comment_count: u64,
    /// Whether new comments are blocked.
    pub locked: bool,
    /// Lifecycle state.
    pub state: DiscussionState,
    /// Browser URL.
    pub url: String,
}

/// A comment on a discussion, optionally replying to another comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Comment node id.
    pub id: CommentId,
    /// Markdown body.
    pub body: String,
    /// Author; `None` for deleted accounts.
    pub author: Option<Author>,
    /// Creation time; comment pages are sorted by this, oldest first.
    pub created_at: DateTime<Utc>,
    /// Last edit time.
    pub updated_at: DateTime<Utc>,
    /// Browser URL.
    pub url: String,
    /// Comment this one replies to.
    pub parent_comment_id: Option<CommentId>,
    /// Whether a moderator hid the comment.
    pub minimized: bool,
}

/// Input for creating a discussion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDiscussion {
    /// Title; must not be blank.
    pub title: String,
    /// Markdown body.
    pub body: String,
    /// Category name, resolved case-insensitively.
    pub category: String,
}

/// Input for adding a comment to a discussion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    /// Discussion receiving the comment.
    pub discussion_id: DiscussionId,
    /// Markdown body; must not be blank.
    pub body: String,
    /// Comment being replied to, for threaded replies.
    pub reply_to: Option<CommentId>,
}
