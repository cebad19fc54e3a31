//! GraphQL response shapes and their conversion into domain models.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{
    Author, Comment, CommentId, Discussion, DiscussionCategory, DiscussionId, DiscussionState,
};
use crate::github::pagination::{Page, PageCursor, PageInfo};

/// Top-level GraphQL envelope. `data` is kept untyped until `errors` has been
/// inspected, because GitHub nulls out fields that failed.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlEnvelope {
    pub(crate) data: Option<serde_json::Value>,
    #[serde(default)]
    pub(crate) errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphQlError {
    pub(crate) message: String,
    #[serde(rename = "type")]
    pub(crate) kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAuthor {
    login: String,
    #[serde(rename = "avatarUrl")]
    avatar_url: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCategory {
    id: String,
    name: String,
    emoji: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiTotalCount {
    total_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiDiscussion {
    id: String,
    number: u64,
    title: String,
    body: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    url: String,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    closed: bool,
    comments: Option<ApiTotalCount>,
    category: ApiCategory,
    author: Option<ApiAuthor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiNodeId {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiComment {
    id: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    url: String,
    #[serde(default)]
    is_minimized: bool,
    reply_to: Option<ApiNodeId>,
    author: Option<ApiAuthor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiPageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiConnection<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<Option<T>>,
    page_info: ApiPageInfo,
    #[serde(default)]
    total_count: u64,
}

impl<T> ApiConnection<T> {
    /// Converts the connection into a page, skipping null nodes that GitHub
    /// returns for items the token cannot see.
    pub(crate) fn into_page<U>(self) -> Page<U>
    where
        T: Into<U>,
    {
        Page {
            items: self.nodes.into_iter().flatten().map(Into::into).collect(),
            page_info: PageInfo {
                end_cursor: self.page_info.end_cursor.map(PageCursor::new),
                has_next: self.page_info.has_next_page,
            },
            total_count: self.total_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DiscussionsData {
    pub(crate) repository: Option<DiscussionsRepository>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DiscussionsRepository {
    pub(crate) discussions: ApiConnection<ApiDiscussion>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentsData {
    pub(crate) repository: Option<CommentsRepository>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentsRepository {
    pub(crate) discussion: Option<CommentsDiscussion>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentsDiscussion {
    pub(crate) comments: ApiConnection<ApiComment>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryIdData {
    pub(crate) repository: Option<ApiNodeId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesData {
    pub(crate) repository: Option<CategoriesRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoriesRepository {
    pub(crate) discussion_categories: CategoryNodes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryNodes {
    #[serde(default)]
    pub(crate) nodes: Vec<ApiCategory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateDiscussionData {
    pub(crate) create_discussion: Option<CreateDiscussionPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateDiscussionPayload {
    pub(crate) discussion: ApiDiscussion,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddCommentData {
    pub(crate) add_discussion_comment: Option<AddCommentPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddCommentPayload {
    pub(crate) comment: ApiComment,
}

impl ApiNodeId {
    pub(crate) fn into_id(self) -> String {
        self.id
    }
}

impl From<ApiAuthor> for Author {
    fn from(value: ApiAuthor) -> Self {
        Self {
            login: value.login,
            avatar_url: value.avatar_url,
            url: value.url,
        }
    }
}

impl From<ApiCategory> for DiscussionCategory {
    fn from(value: ApiCategory) -> Self {
        Self {
            id: value.id,
            name: value.name,
            emoji: value.emoji,
            description: value.description,
        }
    }
}

impl From<ApiDiscussion> for Discussion {
    fn from(value: ApiDiscussion) -> Self {
        Self {
            id: DiscussionId::new(value.id),
            number: value.number,
            title: value.title,
            body: value.body,
            author: value.author.map(Author::from),
            category: value.category.into(),
            created_at: value.created_at,
            updated_at: value.updated_at,
            comment_count: value.comments.map_or(0, |count| count.total_count),
            locked: value.locked,
            state: DiscussionState::from_flags(value.closed, value.locked),
            url: value.url,
        }
    }
}

impl From<ApiComment> for Comment {
    fn from(value: ApiComment) -> Self {
        Self {
            id: CommentId::new(value.id),
            body: value.body,
            author: value.author.map(Author::from),
            created_at: value.created_at,
            updated_at: value.updated_at,
            url: value.url,
            parent_comment_id: value.reply_to.map(|parent| CommentId::new(parent.id)),
            minimized: value.is_minimized,
        }
    }
}
