//! Identity wrappers and repository addressing for GitHub calls.

use url::Url;

use super::error::ApiError;

/// Public GitHub API base used when no other host is configured.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    /// Validates that the owner login is not blank.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when `value` is blank.
    pub fn new(value: &str) -> Result<Self, ApiError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ApiError::Configuration {
                message: "repository owner is required".to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    /// Validates that the repository name is not blank.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when `value` is blank.
    pub fn new(value: &str) -> Result<Self, ApiError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ApiError::Configuration {
                message: "repository name is required".to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Personal access token wrapper enforcing presence.
///
/// The `Debug` output redacts the token so it never lands in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, ApiError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ApiError::Configuration {
                message: "personal access token is required".to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl std::fmt::Debug for PersonalAccessToken {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("PersonalAccessToken(<redacted>)")
    }
}

/// Parses an API base URL, mapping a bare `github.com` host to the public API
/// and any other bare host to the GitHub Enterprise `/api/v3` prefix.
///
/// URLs that already carry a path (including test servers with an explicit
/// path) are used as given.
///
/// # Errors
///
/// Returns [`ApiError::InvalidUrl`] when `input` cannot be parsed or lacks a
/// host.
pub fn parse_api_base(input: &str) -> Result<Url, ApiError> {
    let parsed = Url::parse(input).map_err(|error| ApiError::InvalidUrl(error.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| ApiError::InvalidUrl("URL must include a host".to_owned()))?;

    if host.eq_ignore_ascii_case("github.com") {
        return Url::parse(DEFAULT_API_BASE).map_err(|error| ApiError::InvalidUrl(error.to_string()));
    }

    let is_bare_enterprise_host = parsed.path() == "/"
        && !host.eq_ignore_ascii_case("api.github.com")
        && !is_loopback(host);
    if !is_bare_enterprise_host {
        return Ok(parsed);
    }

    let mut api_url = parsed;
    api_url.set_path("api/v3");
    Ok(api_url)
}

fn is_loopback(host: &str) -> bool {
    host == "localhost" || host == "127.0.0.1" || host == "[::1]"
}

/// Repository address plus the API base used to reach it.
///
/// # Example
///
/// ```
/// use nooknote::github::RepositoryLocator;
///
/// let locator = RepositoryLocator::from_owner_repo("octo", "repo")
///     .expect("should build repository locator");
/// assert_eq!(locator.owner().as_str(), "octo");
/// assert_eq!(locator.repository().as_str(), "repo");
/// assert_eq!(locator.repository_path(), "/repos/octo/repo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    api_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepositoryLocator {
    /// Creates a repository locator on the public GitHub API.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when owner or repo is blank.
    pub fn from_owner_repo(owner: &str, repo: &str) -> Result<Self, ApiError> {
        Self::with_api_base(parse_api_base(DEFAULT_API_BASE)?, owner, repo)
    }

    /// Creates a repository locator on an explicit API base.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when owner or repo is blank.
    pub fn with_api_base(api_base: Url, owner: &str, repo: &str) -> Result<Self, ApiError> {
        Ok(Self {
            api_base,
            owner: RepositoryOwner::new(owner)?,
            repository: RepositoryName::new(repo)?,
        })
    }

    /// API base URL.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Returns the REST path of the repository resource.
    #[must_use]
    pub fn repository_path(&self) -> String {
        format!(
            "/repos/{}/{}",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    /// Returns the browser URL of the repository's discussions.
    #[must_use]
    pub fn discussions_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/discussions",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }
}
