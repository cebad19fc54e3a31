//! Error types surfaced by the GitHub Discussions core.

use thiserror::Error;

use super::rate_limit::RateLimitInfo;

/// Errors surfaced while validating credentials or talking to GitHub.
///
/// Every variant renders a message that distinguishes it from the others so
/// a presentation layer can show an actionable description without matching
/// on the variant itself.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// GitHub rejected the token (HTTP 401).
    #[error("GitHub rejected the personal access token")]
    InvalidToken,

    /// The token lacks the scopes needed for the requested operation.
    #[error(
        "token lacks required permissions (repo, read:discussion, write:discussion): {message}"
    )]
    InsufficientPermissions {
        /// Detail reported by GitHub or by the failed probe.
        message: String,
    },

    /// The API rate limit is exhausted.
    #[error("GitHub API rate limit exceeded{}", describe_reset(.rate_limit.as_ref()))]
    RateLimited {
        /// Rate limit headers captured from the rejected response.
        rate_limit: Option<RateLimitInfo>,
    },

    /// A requested remote resource does not exist.
    #[error("{resource} not found")]
    NotFound {
        /// Human-readable description of the missing resource.
        resource: String,
    },

    /// The configured repository does not exist or is hidden from the token.
    #[error("repository {owner}/{repository} not found or not visible to this token")]
    RepositoryNotFound {
        /// Repository owner login.
        owner: String,
        /// Repository name.
        repository: String,
    },

    /// GitHub answered with an unexpected HTTP status.
    #[error("GitHub server error ({status})")]
    ServerError {
        /// HTTP status code returned by GitHub.
        status: u16,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("could not decode GitHub response: {message}")]
    Decoding {
        /// Deserialisation error detail.
        message: String,
    },

    /// Input was rejected locally before any network call.
    #[error("{message}")]
    Validation {
        /// Description of the rejected input.
        message: String,
    },

    /// The GraphQL endpoint answered 200 but reported errors in the payload.
    #[error("GitHub rejected the query: {message}")]
    QueryRejected {
        /// First error message from the `errors` array.
        message: String,
    },

    /// An operation required a validated credential.
    #[error("GitHub credentials have not been validated")]
    NotAuthenticated,

    /// Another store operation is still in flight.
    #[error("another discussion operation is already in progress")]
    Busy,

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// A URL could not be parsed.
    #[error("URL is invalid: {0}")]
    InvalidUrl(String),

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },
}

impl ApiError {
    /// Builds a [`ApiError::Validation`] from a static description.
    pub(crate) fn validation(message: &str) -> Self {
        Self::Validation {
            message: message.to_owned(),
        }
    }

    /// Returns the reset timestamp when this is a rate-limit failure that
    /// carried one.
    #[must_use]
    pub const fn rate_limit_reset(&self) -> Option<u64> {
        match self {
            Self::RateLimited {
                rate_limit: Some(info),
            } => Some(info.reset_at()),
            _ => None,
        }
    }
}

fn describe_reset(rate_limit: Option<&RateLimitInfo>) -> String {
    rate_limit
        .and_then(RateLimitInfo::reset_time)
        .map(|reset| format!("; try again after {}", reset.to_rfc3339()))
        .unwrap_or_default()
}

impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidToken, Self::InvalidToken)
            | (Self::NotAuthenticated, Self::NotAuthenticated)
            | (Self::Busy, Self::Busy) => true,
            (
                Self::InsufficientPermissions { message: left },
                Self::InsufficientPermissions { message: right },
            )
            | (Self::Network { message: left }, Self::Network { message: right })
            | (Self::Decoding { message: left }, Self::Decoding { message: right })
            | (Self::Validation { message: left }, Self::Validation { message: right })
            | (Self::QueryRejected { message: left }, Self::QueryRejected { message: right })
            | (Self::Configuration { message: left }, Self::Configuration { message: right })
            | (Self::Io { message: left }, Self::Io { message: right })
            | (Self::InvalidUrl(left), Self::InvalidUrl(right))
            | (Self::NotFound { resource: left }, Self::NotFound { resource: right }) => {
                left == right
            }
            (Self::RateLimited { rate_limit: left }, Self::RateLimited { rate_limit: right }) => {
                left == right
            }
            (
                Self::RepositoryNotFound {
                    owner: left_owner,
                    repository: left_repository,
                },
                Self::RepositoryNotFound {
                    owner: right_owner,
                    repository: right_repository,
                },
            ) => left_owner == right_owner && left_repository == right_repository,
            (Self::ServerError { status: left }, Self::ServerError { status: right }) => {
                left == right
            }
            _ => false,
        }
    }
}

impl Eq for ApiError {}
