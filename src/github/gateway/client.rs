//! Octocrab client construction helpers for gateway implementations.

use http::Uri;
use octocrab::Octocrab;
use url::Url;

use crate::github::error::ApiError;
use crate::github::locator::PersonalAccessToken;

use super::error_mapping::map_transport_error;

/// Builds an Octocrab client for the given token and API base URL.
///
/// # Errors
///
/// Returns [`ApiError::InvalidUrl`] when the base URI cannot be parsed or
/// [`ApiError::Network`] when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &Url,
) -> Result<Octocrab, ApiError> {
    let base_uri: Uri = api_base
        .as_str()
        .parse::<Uri>()
        .map_err(|error| ApiError::InvalidUrl(error.to_string()))?;

    Octocrab::builder()
        .personal_token(token.as_ref())
        .base_uri(base_uri)
        .map_err(|error| map_transport_error("build client", &error))?
        .build()
        .map_err(|error| map_transport_error("build client", &error))
}
