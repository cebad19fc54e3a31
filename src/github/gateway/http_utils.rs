//! Shared HTTP utilities for gateway implementations.

use http::{StatusCode, Uri};
use octocrab::Octocrab;
use url::Url;

use crate::github::error::ApiError;
use crate::github::rate_limit::RateLimitInfo;

use super::error_mapping::{FailedResponse, map_transport_error};

/// Status, rate-limit headers, and body of a completed request.
#[derive(Debug)]
pub(super) struct RawResponse {
    pub(super) status: StatusCode,
    pub(super) rate_limit: Option<RateLimitInfo>,
    pub(super) body: String,
}

impl RawResponse {
    pub(super) fn failure<'a>(&self, operation: &'a str) -> FailedResponse<'a> {
        FailedResponse {
            operation,
            status: self.status,
            rate_limit: self.rate_limit,
            message: extract_github_message(&self.body),
        }
    }
}

/// Issues a `GET` and drains the response into a [`RawResponse`].
pub(super) async fn get_raw(
    client: &Octocrab,
    operation: &str,
    uri: Uri,
) -> Result<RawResponse, ApiError> {
    let response = client
        ._get(uri)
        .await
        .map_err(|error| map_transport_error(operation, &error))?;
    let status = response.status();
    let rate_limit = RateLimitInfo::from_headers(response.headers());
    let body = client.body_to_string(response).await;
    finish(operation, status, rate_limit, body)
}

/// Issues a JSON `POST` and drains the response into a [`RawResponse`].
pub(super) async fn post_raw(
    client: &Octocrab,
    operation: &str,
    uri: Uri,
    payload: &serde_json::Value,
) -> Result<RawResponse, ApiError> {
    let response = client
        ._post(uri, Some(payload))
        .await
        .map_err(|error| map_transport_error(operation, &error))?;
    let status = response.status();
    let rate_limit = RateLimitInfo::from_headers(response.headers());
    let body = client.body_to_string(response).await;
    finish(operation, status, rate_limit, body)
}

/// An unreadable body on a failed status is treated as empty so the status
/// still drives classification.
fn finish(
    operation: &str,
    status: StatusCode,
    rate_limit: Option<RateLimitInfo>,
    body_result: Result<String, octocrab::Error>,
) -> Result<RawResponse, ApiError> {
    let body = match body_result {
        Ok(body) => body,
        Err(error) if status.is_success() => return Err(map_transport_error(operation, &error)),
        Err(_) => String::new(),
    };

    Ok(RawResponse {
        status,
        rate_limit,
        body,
    })
}

/// Joins `path` onto the API base, preserving any base path prefix such as
/// `/api/v3`.
pub(super) fn endpoint(api_base: &Url, path: &str) -> Result<Uri, ApiError> {
    format!(
        "{}/{}",
        api_base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
    .parse::<Uri>()
    .map_err(|error| ApiError::InvalidUrl(error.to_string()))
}

/// GraphQL endpoint for the API base. GitHub Enterprise serves GraphQL from
/// `/api/graphql` rather than under the REST `/api/v3` prefix.
pub(super) fn graphql_endpoint(api_base: &Url) -> Result<Uri, ApiError> {
    let base = api_base.as_str().trim_end_matches('/');
    match base.strip_suffix("/api/v3") {
        Some(host) => format!("{host}/api/graphql")
            .parse::<Uri>()
            .map_err(|error| ApiError::InvalidUrl(error.to_string())),
        None => endpoint(api_base, "graphql"),
    }
}

pub(super) fn extract_github_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return None;
    };
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}
