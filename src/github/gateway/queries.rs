//! GraphQL documents and variable builders for the discussions endpoint.

use serde_json::{Value, json};

use crate::github::locator::RepositoryLocator;
use crate::github::models::NewComment;
use crate::github::pagination::PageRequest;

/// Maximum number of categories a repository can define.
pub(super) const CATEGORY_LIMIT: u8 = 25;

const DISCUSSION_FIELDS: &str = "
    id
    number
    title
    body
    createdAt
    updatedAt
    url
    locked
    closed
    comments { totalCount }
    category { id name emoji description }
    author { login avatarUrl url }
";

const COMMENT_FIELDS: &str = "
    id
    body
    createdAt
    updatedAt
    url
    isMinimized
    replyTo { id }
    author { login avatarUrl url }
";

/// Cheapest query that still touches the discussions API.
pub(super) const SCOPE_PROBE: &str = "
query ScopeProbe($owner: String!, $repo: String!) {
  repository(owner: $owner, name: $repo) {
    discussions(first: 1) { totalCount }
  }
}";

pub(super) fn discussions_query() -> String {
    format!(
        "
query Discussions($owner: String!, $repo: String!, $first: Int!, $after: String) {{
  repository(owner: $owner, name: $repo) {{
    discussions(first: $first, after: $after, orderBy: {{field: UPDATED_AT, direction: DESC}}) {{
      totalCount
      pageInfo {{ hasNextPage endCursor }}
      nodes {{ {DISCUSSION_FIELDS} }}
    }}
  }}
}}"
    )
}

pub(super) fn comments_query() -> String {
    format!(
        "
query DiscussionComments($owner: String!, $repo: String!, $number: Int!, $first: Int!, $after: String) {{
  repository(owner: $owner, name: $repo) {{
    discussion(number: $number) {{
      comments(first: $first, after: $after) {{
        totalCount
        pageInfo {{ hasNextPage endCursor }}
        nodes {{ {COMMENT_FIELDS} }}
      }}
    }}
  }}
}}"
    )
}

pub(super) const REPOSITORY_ID_QUERY: &str = "
query RepositoryId($owner: String!, $repo: String!) {
  repository(owner: $owner, name: $repo) { id }
}";

pub(super) const CATEGORIES_QUERY: &str = "
query DiscussionCategories($owner: String!, $repo: String!, $first: Int!) {
  repository(owner: $owner, name: $repo) {
    discussionCategories(first: $first) {
      nodes { id name emoji description }
    }
  }
}";

pub(super) fn create_discussion_mutation() -> String {
    format!(
        "
mutation CreateDiscussion($repositoryId: ID!, $categoryId: ID!, $title: String!, $body: String!) {{
  createDiscussion(input: {{repositoryId: $repositoryId, categoryId: $categoryId, title: $title, body: $body}}) {{
    discussion {{ {DISCUSSION_FIELDS} }}
  }}
}}"
    )
}

pub(super) fn add_comment_mutation() -> String {
    format!(
        "
mutation AddDiscussionComment($discussionId: ID!, $body: String!, $replyToId: ID) {{
  addDiscussionComment(input: {{discussionId: $discussionId, body: $body, replyToId: $replyToId}}) {{
    comment {{ {COMMENT_FIELDS} }}
  }}
}}"
    )
}

/// Wraps a document and its variables into a request payload.
pub(super) fn payload(query: &str, variables: Value) -> Value {
    json!({ "query": query, "variables": variables })
}

pub(super) fn repository_variables(repository: &RepositoryLocator) -> Value {
    json!({
        "owner": repository.owner().as_str(),
        "repo": repository.repository().as_str(),
    })
}

/// Repository variables plus `first`, and `after` only when resuming.
pub(super) fn page_variables(repository: &RepositoryLocator, request: &PageRequest) -> Value {
    let mut variables = repository_variables(repository);
    if let Some(object) = variables.as_object_mut() {
        object.insert("first".to_owned(), json!(request.page_size.get()));
        if let Some(cursor) = &request.after {
            object.insert("after".to_owned(), json!(cursor.as_str()));
        }
    }
    variables
}

pub(super) fn comment_page_variables(
    repository: &RepositoryLocator,
    discussion_number: u64,
    request: &PageRequest,
) -> Value {
    let mut variables = page_variables(repository, request);
    if let Some(object) = variables.as_object_mut() {
        object.insert("number".to_owned(), json!(discussion_number));
    }
    variables
}

pub(super) fn add_comment_variables(comment: &NewComment) -> Value {
    let mut variables = json!({
        "discussionId": comment.discussion_id.as_str(),
        "body": comment.body,
    });
    if let (Some(object), Some(parent)) = (variables.as_object_mut(), &comment.reply_to) {
        object.insert("replyToId".to_owned(), json!(parent.as_str()));
    }
    variables
}
