//! Octocrab-backed discussion gateway.

use std::sync::Arc;

use async_trait::async_trait;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::Url;

use crate::github::error::ApiError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::github::models::api::{
    AddCommentData, CategoriesData, CommentsData, CreateDiscussionData, DiscussionsData,
    GraphQlEnvelope, RepositoryIdData,
};
use crate::github::models::{Comment, Discussion, DiscussionCategory, NewComment, NewDiscussion};
use crate::github::pagination::{Page, PageRequest};

use super::client::build_octocrab_client;
use super::error_mapping::{StatusPolicy, map_decode_error, map_graphql_error, map_status};
use super::http_utils::{endpoint, get_raw, graphql_endpoint, post_raw};
use super::queries::{
    CATEGORIES_QUERY, CATEGORY_LIMIT, REPOSITORY_ID_QUERY, SCOPE_PROBE, add_comment_mutation,
    add_comment_variables, comment_page_variables, comments_query, create_discussion_mutation,
    discussions_query, page_variables, payload, repository_variables,
};
use super::{DiscussionGateway, GatewayConnector};

/// Octocrab-backed gateway for one token.
pub struct OctocrabDiscussionGateway {
    client: Octocrab,
    api_base: Url,
}

impl OctocrabDiscussionGateway {
    /// Creates a gateway using the given token and API base.
    ///
    /// Must be called inside a Tokio runtime; Octocrab spawns its service
    /// task on construction.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the Octocrab client cannot be built.
    pub fn for_token(token: &PersonalAccessToken, api_base: &Url) -> Result<Self, ApiError> {
        let client = build_octocrab_client(token, api_base)?;
        Ok(Self {
            client,
            api_base: api_base.clone(),
        })
    }

    async fn rest_probe(
        &self,
        operation: &str,
        path: &str,
        policy: StatusPolicy<'_>,
    ) -> Result<(), ApiError> {
        let uri = endpoint(&self.api_base, path)?;
        let response = get_raw(&self.client, operation, uri).await?;
        tracing::debug!(operation, status = %response.status, "REST probe finished");

        if response.status.is_success() {
            Ok(())
        } else {
            Err(map_status(policy, &response.failure(operation)))
        }
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        operation: &str,
        resource: &str,
        request: &Value,
    ) -> Result<T, ApiError> {
        let uri = graphql_endpoint(&self.api_base)?;
        let response = post_raw(&self.client, operation, uri, request).await?;
        tracing::debug!(operation, status = %response.status, "GraphQL call finished");

        if !response.status.is_success() {
            return Err(map_status(
                StatusPolicy::Data { resource },
                &response.failure(operation),
            ));
        }

        decode_data(operation, resource, &response.body)
    }

    async fn repository_id(&self, repository: &RepositoryLocator) -> Result<String, ApiError> {
        let data: RepositoryIdData = self
            .graphql(
                "resolve repository id",
                &repository_resource(repository),
                &payload(REPOSITORY_ID_QUERY, repository_variables(repository)),
            )
            .await?;

        data.repository
            .map(|node| node.into_id())
            .ok_or_else(|| repository_not_found(repository))
    }
}

fn decode_envelope(operation: &str, body: &str) -> Result<GraphQlEnvelope, ApiError> {
    serde_json::from_str(body).map_err(|error| map_decode_error(operation, &error))
}

/// Decodes `data` only once the `errors` array has been checked.
fn decode_data<T: DeserializeOwned>(
    operation: &str,
    resource: &str,
    body: &str,
) -> Result<T, ApiError> {
    let envelope = decode_envelope(operation, body)?;

    if let Some(error) = envelope.errors.first() {
        tracing::warn!(
            operation,
            kind = error.kind.as_deref().unwrap_or("unknown"),
            "GraphQL call returned errors: {}",
            error.message
        );
        return Err(map_graphql_error(error, resource));
    }

    let data = envelope.data.ok_or_else(|| ApiError::Decoding {
        message: format!("{operation}: response carried neither data nor errors"),
    })?;
    serde_json::from_value(data).map_err(|error| map_decode_error(operation, &error))
}

fn repository_resource(repository: &RepositoryLocator) -> String {
    format!(
        "repository {}/{}",
        repository.owner().as_str(),
        repository.repository().as_str()
    )
}

fn repository_not_found(repository: &RepositoryLocator) -> ApiError {
    ApiError::RepositoryNotFound {
        owner: repository.owner().as_str().to_owned(),
        repository: repository.repository().as_str().to_owned(),
    }
}

fn find_category(
    categories: Vec<DiscussionCategory>,
    name: &str,
) -> Result<DiscussionCategory, ApiError> {
    let wanted = name.trim().to_lowercase();
    categories
        .into_iter()
        .find(|category| category.name.to_lowercase() == wanted)
        .ok_or_else(|| ApiError::NotFound {
            resource: format!("discussion category '{}'", name.trim()),
        })
}

#[async_trait]
impl DiscussionGateway for OctocrabDiscussionGateway {
    async fn validate_identity(&self) -> Result<(), ApiError> {
        self.rest_probe("validate identity", "/user", StatusPolicy::Identity)
            .await
    }

    async fn validate_repository_access(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<(), ApiError> {
        self.rest_probe(
            "validate repository access",
            &repository.repository_path(),
            StatusPolicy::Repository(repository),
        )
        .await
    }

    async fn validate_discussions_scope(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<(), ApiError> {
        let operation = "validate discussions scope";
        let uri = graphql_endpoint(&self.api_base)?;
        let request = payload(SCOPE_PROBE, repository_variables(repository));
        let response = post_raw(&self.client, operation, uri, &request).await?;

        if !response.status.is_success() {
            return Err(map_status(
                StatusPolicy::DiscussionsScope,
                &response.failure(operation),
            ));
        }

        let envelope = decode_envelope(operation, &response.body)?;
        match envelope.errors.into_iter().next() {
            Some(error) => Err(ApiError::InsufficientPermissions {
                message: error.message,
            }),
            None => Ok(()),
        }
    }

    async fn fetch_discussions(
        &self,
        repository: &RepositoryLocator,
        request: &PageRequest,
    ) -> Result<Page<Discussion>, ApiError> {
        let data: DiscussionsData = self
            .graphql(
                "fetch discussions",
                &repository_resource(repository),
                &payload(&discussions_query(), page_variables(repository, request)),
            )
            .await?;

        let remote = data
            .repository
            .ok_or_else(|| repository_not_found(repository))?;
        Ok(remote.discussions.into_page())
    }

    async fn fetch_comments(
        &self,
        repository: &RepositoryLocator,
        discussion_number: u64,
        request: &PageRequest,
    ) -> Result<Page<Comment>, ApiError> {
        let resource = format!("discussion #{discussion_number}");
        let data: CommentsData = self
            .graphql(
                "fetch comments",
                &resource,
                &payload(
                    &comments_query(),
                    comment_page_variables(repository, discussion_number, request),
                ),
            )
            .await?;

        let discussion = data
            .repository
            .ok_or_else(|| repository_not_found(repository))?
            .discussion
            .ok_or(ApiError::NotFound { resource })?;
        Ok(discussion.comments.into_page())
    }

    async fn list_categories(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<Vec<DiscussionCategory>, ApiError> {
        let mut variables = repository_variables(repository);
        if let Some(object) = variables.as_object_mut() {
            object.insert("first".to_owned(), json!(CATEGORY_LIMIT));
        }

        let data: CategoriesData = self
            .graphql(
                "list categories",
                &repository_resource(repository),
                &payload(CATEGORIES_QUERY, variables),
            )
            .await?;

        let remote = data
            .repository
            .ok_or_else(|| repository_not_found(repository))?;
        Ok(remote
            .discussion_categories
            .nodes
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn create_discussion(
        &self,
        repository: &RepositoryLocator,
        discussion: &NewDiscussion,
    ) -> Result<Discussion, ApiError> {
        let repository_id = self.repository_id(repository).await?;
        let category = find_category(self.list_categories(repository).await?, &discussion.category)?;
        tracing::debug!(
            category = %category.name,
            "creating discussion in {}/{}",
            repository.owner().as_str(),
            repository.repository().as_str()
        );

        let variables = json!({
            "repositoryId": repository_id,
            "categoryId": category.id,
            "title": discussion.title,
            "body": discussion.body,
        });
        let data: CreateDiscussionData = self
            .graphql(
                "create discussion",
                &repository_resource(repository),
                &payload(&create_discussion_mutation(), variables),
            )
            .await?;

        data.create_discussion
            .map(|created| created.discussion.into())
            .ok_or_else(|| ApiError::Decoding {
                message: "create discussion: mutation returned no discussion".to_owned(),
            })
    }

    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, ApiError> {
        let data: AddCommentData = self
            .graphql(
                "add comment",
                &format!("discussion {}", comment.discussion_id),
                &payload(&add_comment_mutation(), add_comment_variables(comment)),
            )
            .await?;

        data.add_discussion_comment
            .map(|created| created.comment.into())
            .ok_or_else(|| ApiError::Decoding {
                message: "add comment: mutation returned no comment".to_owned(),
            })
    }
}

/// Connector that builds [`OctocrabDiscussionGateway`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct OctocrabConnector;

impl GatewayConnector for OctocrabConnector {
    fn connect(
        &self,
        token: &PersonalAccessToken,
        api_base: &Url,
    ) -> Result<Arc<dyn DiscussionGateway>, ApiError> {
        Ok(Arc::new(OctocrabDiscussionGateway::for_token(
            token, api_base,
        )?))
    }
}
