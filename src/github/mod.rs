//! GitHub Discussions access and token validation.
//!
//! This module wraps Octocrab to validate personal access tokens, page through
//! discussions and their comments, and post new discussions and comments.
//! Errors are mapped into [`ApiError`] variants so that callers can surface
//! precise failures without exposing Octocrab internals.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;
pub mod pagination;
pub mod rate_limit;

pub use error::ApiError;
pub use gateway::{DiscussionGateway, GatewayConnector, OctocrabConnector, OctocrabDiscussionGateway};
pub use locator::{
    DEFAULT_API_BASE, PersonalAccessToken, RepositoryLocator, RepositoryName, RepositoryOwner,
    parse_api_base,
};
pub use models::{
    Author, Comment, CommentId, Discussion, DiscussionCategory, DiscussionId, DiscussionState,
    NewComment, NewDiscussion,
};
pub use pagination::{Page, PageCursor, PageInfo, PageRequest, PageSize};
pub use rate_limit::RateLimitInfo;

#[cfg(test)]
pub use gateway::{MockDiscussionGateway, MockGatewayConnector};

#[cfg(test)]
mod tests;
