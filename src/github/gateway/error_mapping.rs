//! Classification of HTTP and GraphQL failures into [`ApiError`].
//!
//! The identity, repository, and scope checks each read status codes
//! differently, so the caller names the [`StatusPolicy`] that applies.

use http::StatusCode;

use crate::github::error::ApiError;
use crate::github::locator::RepositoryLocator;
use crate::github::models::api::GraphQlError;
use crate::github::rate_limit::RateLimitInfo;

/// How a non-success status should be read for a given call.
#[derive(Debug, Clone, Copy)]
pub(super) enum StatusPolicy<'a> {
    /// `GET /user`: 403 means the quota is exhausted.
    Identity,
    /// `GET /repos/{owner}/{repo}`: 403 means the token cannot see the repo.
    Repository(&'a RepositoryLocator),
    /// The GraphQL discussions probe: 403 means the scope is missing.
    DiscussionsScope,
    /// Any GraphQL data call; `resource` names what was being fetched.
    Data {
        /// Human-readable resource description used for 404s.
        resource: &'a str,
    },
}

/// Non-success response details needed for classification.
#[derive(Debug)]
pub(super) struct FailedResponse<'a> {
    pub(super) operation: &'a str,
    pub(super) status: StatusCode,
    pub(super) rate_limit: Option<RateLimitInfo>,
    pub(super) message: Option<String>,
}

impl FailedResponse<'_> {
    fn describe(&self) -> String {
        let message = self.message.as_deref().unwrap_or("no message");
        format!(
            "{operation} failed with status {status}: {message}",
            operation = self.operation,
            status = self.status
        )
    }
}

pub(super) fn map_status(policy: StatusPolicy<'_>, response: &FailedResponse<'_>) -> ApiError {
    if response.status == StatusCode::UNAUTHORIZED {
        return ApiError::InvalidToken;
    }

    match policy {
        StatusPolicy::Identity => match response.status {
            StatusCode::FORBIDDEN => ApiError::RateLimited {
                rate_limit: response.rate_limit,
            },
            _ => network(response),
        },
        StatusPolicy::Repository(repository) => match response.status {
            StatusCode::FORBIDDEN => ApiError::InsufficientPermissions {
                message: response.describe(),
            },
            StatusCode::NOT_FOUND => ApiError::RepositoryNotFound {
                owner: repository.owner().as_str().to_owned(),
                repository: repository.repository().as_str().to_owned(),
            },
            _ => network(response),
        },
        StatusPolicy::DiscussionsScope => match response.status {
            StatusCode::FORBIDDEN => ApiError::InsufficientPermissions {
                message: response.describe(),
            },
            _ => network(response),
        },
        StatusPolicy::Data { resource } => match response.status {
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited {
                rate_limit: response.rate_limit,
            },
            StatusCode::NOT_FOUND => ApiError::NotFound {
                resource: resource.to_owned(),
            },
            status => ApiError::ServerError {
                status: status.as_u16(),
            },
        },
    }
}

fn network(response: &FailedResponse<'_>) -> ApiError {
    ApiError::Network {
        message: response.describe(),
    }
}

/// Maps the first entry of a GraphQL `errors` array.
pub(super) fn map_graphql_error(error: &GraphQlError, resource: &str) -> ApiError {
    match error.kind.as_deref() {
        Some("NOT_FOUND") => ApiError::NotFound {
            resource: resource.to_owned(),
        },
        Some("FORBIDDEN" | "INSUFFICIENT_SCOPES") => ApiError::InsufficientPermissions {
            message: error.message.clone(),
        },
        Some("RATE_LIMITED") => ApiError::RateLimited { rate_limit: None },
        _ => ApiError::QueryRejected {
            message: error.message.clone(),
        },
    }
}

/// Maps a failure raised by the HTTP client before any status was seen.
pub(super) fn map_transport_error(operation: &str, error: &octocrab::Error) -> ApiError {
    ApiError::Network {
        message: format!("{operation} failed: {error}"),
    }
}

pub(super) fn map_decode_error(operation: &str, error: &serde_json::Error) -> ApiError {
    ApiError::Decoding {
        message: format!("{operation}: {error}"),
    }
}
