//! Builders for discussion fixtures shared by unit and behavioural tests.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

use super::{Author, Comment, CommentId, Discussion, DiscussionCategory, DiscussionId, DiscussionState};

fn fixture_time(offset_hours: u64) -> DateTime<Utc> {
    let base = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    base + chrono::Duration::hours(i64::try_from(offset_hours).unwrap_or(0))
}

/// Returns the `General` category used by fixtures.
#[must_use]
pub fn general_category() -> DiscussionCategory {
    DiscussionCategory {
        id: "DIC_general".to_owned(),
        name: "General".to_owned(),
        emoji: Some(":speech_balloon:".to_owned()),
        description: Some("Chat about anything".to_owned()),
    }
}

/// Builds a discussion whose id is derived from `number`.
#[must_use]
pub fn discussion(number: u64) -> Discussion {
    Discussion {
        id: DiscussionId::new(format!("D_{number}")),
        number,
        title: format!("Discussion {number}"),
        body: Some(format!("Body of discussion {number}")),
        author: Some(Author {
            login: "octocat".to_owned(),
            avatar_url: None,
            url: Some("https://github.com/octocat".to_owned()),
        }),
        category: general_category(),
        created_at: fixture_time(number),
        updated_at: fixture_time(number + 1),
        comment_count: 0,
        locked: false,
        state: DiscussionState::Open,
        url: format!("https://github.com/octo/repo/discussions/{number}"),
    }
}

/// Builds discussions for each number, in the given order.
#[must_use]
pub fn discussions(numbers: impl IntoIterator<Item = u64>) -> Vec<Discussion> {
    numbers.into_iter().map(discussion).collect()
}

/// Builds a top-level comment whose id is derived from `index`.
#[must_use]
pub fn comment(index: u64) -> Comment {
    Comment {
        id: CommentId::new(format!("DC_{index}")),
        body: format!("comment {index}"),
        author: None,
        created_at: fixture_time(index),
        updated_at: fixture_time(index),
        url: format!("https://github.com/octo/repo/discussions/1#discussioncomment-{index}"),
        parent_comment_id: None,
        minimized: false,
    }
}

/// GraphQL JSON node matching [`discussion`].
#[must_use]
pub fn discussion_node(number: u64) -> Value {
    json!({
        "id": format!("D_{number}"),
        "number": number,
        "title": format!("Discussion {number}"),
        "body": format!("Body of discussion {number}"),
        "createdAt": fixture_time(number).to_rfc3339(),
        "updatedAt": fixture_time(number + 1).to_rfc3339(),
        "url": format!("https://github.com/octo/repo/discussions/{number}"),
        "locked": false,
        "closed": false,
        "comments": { "totalCount": 0 },
        "category": {
            "id": "DIC_general",
            "name": "General",
            "emoji": ":speech_balloon:",
            "description": "Chat about anything"
        },
        "author": { "login": "octocat", "avatarUrl": null, "url": "https://github.com/octocat" }
    })
}

/// GraphQL body for a discussions page.
#[must_use]
pub fn discussions_body(numbers: &[u64], end_cursor: Option<&str>, has_next: bool) -> Value {
    let nodes: Vec<Value> = numbers.iter().copied().map(discussion_node).collect();
    json!({
        "data": {
            "repository": {
                "discussions": {
                    "totalCount": nodes.len(),
                    "pageInfo": { "hasNextPage": has_next, "endCursor": end_cursor },
                    "nodes": nodes
                }
            }
        }
    })
}

/// GraphQL JSON node matching [`comment`].
#[must_use]
pub fn comment_node(index: u64) -> Value {
    json!({
        "id": format!("DC_{index}"),
        "body": format!("comment {index}"),
        "createdAt": fixture_time(index).to_rfc3339(),
        "updatedAt": fixture_time(index).to_rfc3339(),
        "url": format!("https://github.com/octo/repo/discussions/1#discussioncomment-{index}"),
        "isMinimized": false,
        "replyTo": null,
        "author": null
    })
}

/// GraphQL body carrying only an `errors` array.
#[must_use]
pub fn graphql_error_body(kind: &str, message: &str) -> Value {
    json!({
        "data": null,
        "errors": [{ "type": kind, "message": message }]
    })
}
