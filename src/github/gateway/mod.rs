//! Gateways for talking to GitHub Discussions through Octocrab.
//!
//! This module provides trait-based gateways for communicating with the GitHub
//! REST and GraphQL APIs. The traits enable mocking in tests while the
//! Octocrab implementations handle real HTTP requests.

mod client;
mod discussions;
mod error_mapping;
mod http_utils;
mod queries;


pub use discussions::{OctocrabConnector, OctocrabDiscussionGateway};

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::github::error::ApiError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::github::models::{Comment, Discussion, DiscussionCategory, NewComment, NewDiscussion};
use crate::github::pagination::{Page, PageRequest};

/// Gateway for discussion reads, writes, and credential probes.
///
/// One gateway is bound to one token; the repository is passed per call.
/// Implementations never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscussionGateway: Send + Sync {
    /// Checks that the token identifies a user (`GET /user`).
    async fn validate_identity(&self) -> Result<(), ApiError>;

    /// Checks that the token can see the repository.
    async fn validate_repository_access(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<(), ApiError>;

    /// Checks that the token may query discussions in the repository.
    async fn validate_discussions_scope(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<(), ApiError>;

    /// Fetch one page of discussions, most recently updated first.
    async fn fetch_discussions(
        &self,
        repository: &RepositoryLocator,
        request: &PageRequest,
    ) -> Result<Page<Discussion>, ApiError>;

    /// Fetch one page of a discussion's comments, oldest first.
    async fn fetch_comments(
        &self,
        repository: &RepositoryLocator,
        discussion_number: u64,
        request: &PageRequest,
    ) -> Result<Page<Comment>, ApiError>;

    /// List the repository's discussion categories.
    async fn list_categories(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<Vec<DiscussionCategory>, ApiError>;

    /// Create a discussion, resolving the category by name.
    async fn create_discussion(
        &self,
        repository: &RepositoryLocator,
        discussion: &NewDiscussion,
    ) -> Result<Discussion, ApiError>;

    /// Add a comment, or a reply when `reply_to` is set.
    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, ApiError>;
}

/// Builds gateways for a token and API base.
#[cfg_attr(test, mockall::automock)]
pub trait GatewayConnector: Send + Sync {
    /// Builds a gateway bound to `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the underlying client cannot be constructed.
    fn connect(
        &self,
        token: &PersonalAccessToken,
        api_base: &Url,
    ) -> Result<Arc<dyn DiscussionGateway>, ApiError>;
}
