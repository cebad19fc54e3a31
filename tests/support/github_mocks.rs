//! Wiremock responders for the GitHub endpoints the sync core touches.

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

/// `GET /user` answering with `status`.
pub fn identity(status: u16) -> Mock {
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "login": "octocat" })))
}

/// `GET /repos/{owner}/{repo}` answering with `status`.
pub fn repository(owner: &str, repo: &str, status: u16) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{owner}/{repo}")))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(json!({ "full_name": format!("{owner}/{repo}") })),
        )
}

/// Scope probe succeeding with a repository id.
pub fn scope_granted() -> Mock {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("ScopeProbe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "repository": { "id": "R_1", "discussions": { "totalCount": 0 } } }
        })))
}

/// Scope probe answered 200 with a GraphQL `errors` array.
pub fn scope_denied() -> Mock {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("ScopeProbe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{
                "type": "INSUFFICIENT_SCOPES",
                "message": "Your token has not been granted the required scopes"
            }]
        })))
}

/// Every check of a successful validation for `owner/repo`.
pub fn valid_credentials(owner: &str, repo: &str) -> Vec<Mock> {
    vec![identity(200), repository(owner, repo, 200), scope_granted()]
}
