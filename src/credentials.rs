//! Credential context snapshots and their change notifications.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use url::Url;

use crate::events::Listeners;
use crate::github::{ApiError, PersonalAccessToken, RepositoryLocator};

/// Owner, repository, and token needed to address and authorise every call.
///
/// Fields are trimmed on construction; a field holding only whitespace is
/// empty.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialContext {
    owner: String,
    repo: String,
    token: String,
}

impl CredentialContext {
    /// Builds a context from raw settings values.
    #[must_use]
    pub fn new(owner: &str, repo: &str, token: &str) -> Self {
        Self {
            owner: owner.trim().to_owned(),
            repo: repo.trim().to_owned(),
            token: token.trim().to_owned(),
        }
    }

    /// Repository owner login.
    #[must_use]
    pub const fn owner(&self) -> &str {
        self.owner.as_str()
    }

    /// Repository name.
    #[must_use]
    pub const fn repo(&self) -> &str {
        self.repo.as_str()
    }

    /// Whether a token is present.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    /// True when all three fields are non-empty.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty() && !self.token.is_empty()
    }

    /// Builds the typed token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when the token is empty.
    pub fn personal_access_token(&self) -> Result<PersonalAccessToken, ApiError> {
        PersonalAccessToken::new(&self.token)
    }

    /// Builds a repository locator on `api_base`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when owner or repo is empty.
    pub fn locator(&self, api_base: &Url) -> Result<RepositoryLocator, ApiError> {
        RepositoryLocator::with_api_base(api_base.clone(), &self.owner, &self.repo)
    }
}

impl fmt::Debug for CredentialContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CredentialContext")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &if self.has_token() { "<redacted>" } else { "" })
            .finish()
    }
}

/// Read-only settings collaborator with synchronous change notification.
///
/// Every [`publish`](Self::publish) notifies subscribers, even when the
/// snapshot is unchanged; consumers decide what counts as a change.
#[derive(Default)]
pub struct CredentialSource {
    current: Mutex<CredentialContext>,
    listeners: Listeners<CredentialContext>,
}

impl CredentialSource {
    /// Creates a source holding `initial`.
    #[must_use]
    pub fn new(initial: CredentialContext) -> Self {
        Self {
            current: Mutex::new(initial),
            listeners: Listeners::default(),
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CredentialContext {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the snapshot and notifies subscribers.
    pub fn publish(&self, context: CredentialContext) {
        let published = context.clone();
        {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            *current = context;
        }
        self.listeners.notify(&published);
    }

    /// Registers `callback` for every published snapshot.
    pub fn subscribe(&self, callback: impl Fn(&CredentialContext) + Send + Sync + 'static) {
        self.listeners.add(callback);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rstest::rstest;

    use super::{CredentialContext, CredentialSource};

    #[rstest]
    #[case::complete("octo", "repo", "ghp_x", true)]
    #[case::missing_owner("", "repo", "ghp_x", false)]
    #[case::whitespace_repo("octo", "   ", "ghp_x", false)]
    #[case::whitespace_token("octo", "repo", " \n", false)]
    fn configured_requires_every_field(
        #[case] owner: &str,
        #[case] repo: &str,
        #[case] token: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(
            CredentialContext::new(owner, repo, token).is_configured(),
            expected
        );
    }

    #[rstest]
    fn surrounding_whitespace_does_not_change_identity() {
        assert_eq!(
            CredentialContext::new(" octo", "repo ", " ghp_x\n"),
            CredentialContext::new("octo", "repo", "ghp_x")
        );
    }

    #[rstest]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", CredentialContext::new("octo", "repo", "ghp_secret"));
        assert!(!rendered.contains("ghp_secret"), "token leaked: {rendered}");
    }

    #[rstest]
    fn publish_updates_snapshot_and_notifies() {
        let source = CredentialSource::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        source.subscribe(move |context| {
            sink.lock()
                .expect("listener mutex should be available")
                .push(context.owner().to_owned());
        });

        source.publish(CredentialContext::new("octo", "repo", "ghp_x"));

        assert_eq!(source.snapshot().owner(), "octo");
        assert_eq!(
            *seen.lock().expect("listener mutex should be available"),
            vec!["octo".to_owned()]
        );
    }
}
