//! Authentication state machine for the configured credential context.
//!
//! Credential changes are applied synchronously and never start validation;
//! only an explicit [`AuthStateMachine::validate`] call touches the network.
//! Each credential change bumps a generation counter so a validation that
//! finishes after the context moved on is discarded.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use url::Url;

use crate::credentials::{CredentialContext, CredentialSource};
use crate::events::Listeners;
use crate::github::{ApiError, DiscussionGateway, GatewayConnector, RepositoryLocator};


/// Authentication state; exactly one is active at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// At least one credential field is empty.
    #[default]
    NotConfigured,
    /// All fields are present but have not been validated.
    Configured,
    /// A validation run is in flight.
    Validating,
    /// Identity, repository access, and discussions scope all checked out.
    Valid,
    /// The last validation run failed.
    Invalid(ApiError),
}

impl AuthState {
    /// Short lowercase label, used in logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Configured => "configured",
            Self::Validating => "validating",
            Self::Valid => "valid",
            Self::Invalid(_) => "invalid",
        }
    }

    /// True in every state except [`AuthState::NotConfigured`].
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        !matches!(self, Self::NotConfigured)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(reason) => write!(formatter, "invalid: {reason}"),
            other => formatter.write_str(other.label()),
        }
    }
}

/// Gateway and repository that passed validation together.
#[derive(Clone)]
pub struct AuthorizedSession {
    gateway: Arc<dyn DiscussionGateway>,
    repository: RepositoryLocator,
}

impl AuthorizedSession {
    /// Gateway bound to the validated token.
    #[must_use]
    pub fn gateway(&self) -> &dyn DiscussionGateway {
        self.gateway.as_ref()
    }

    /// Validated repository.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryLocator {
        &self.repository
    }
}

impl fmt::Debug for AuthorizedSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthorizedSession")
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: AuthState,
    context: CredentialContext,
    generation: u64,
    session: Option<AuthorizedSession>,
}

impl Inner {
    /// Sets `next` and returns it when it differs from the current state.
    fn transition(&mut self, next: AuthState) -> Option<AuthState> {
        if self.state == next {
            return None;
        }
        tracing::info!(
            from = self.state.label(),
            to = next.label(),
            "authentication state changed"
        );
        self.state = next.clone();
        Some(next)
    }
}

/// Finite authentication state driven by gateway probes.
pub struct AuthStateMachine {
    connector: Arc<dyn GatewayConnector>,
    api_base: Url,
    inner: Mutex<Inner>,
    listeners: Listeners<AuthState>,
}

impl AuthStateMachine {
    /// Creates a machine in [`AuthState::NotConfigured`].
    #[must_use]
    pub fn new(connector: Arc<dyn GatewayConnector>, api_base: Url) -> Self {
        Self {
            connector,
            api_base,
            inner: Mutex::new(Inner::default()),
            listeners: Listeners::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, changed: Option<AuthState>) {
        if let Some(state) = changed {
            self.listeners.notify(&state);
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.lock().state.clone()
    }

    /// True iff the state is [`AuthState::Valid`].
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().state == AuthState::Valid
    }

    /// Credential context the state refers to.
    #[must_use]
    pub fn context(&self) -> CredentialContext {
        self.lock().context.clone()
    }

    /// API base the machine connects to.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Returns the validated session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotAuthenticated`] unless the state is
    /// [`AuthState::Valid`].
    pub fn authorized(&self) -> Result<AuthorizedSession, ApiError> {
        let inner = self.lock();
        match (&inner.state, &inner.session) {
            (AuthState::Valid, Some(session)) => Ok(session.clone()),
            _ => Err(ApiError::NotAuthenticated),
        }
    }

    /// Registers `callback` for every state transition.
    pub fn subscribe(&self, callback: impl Fn(&AuthState) + Send + Sync + 'static) {
        self.listeners.add(callback);
    }

    /// Applies the source's current snapshot and follows its changes.
    pub fn observe(self: &Arc<Self>, source: &CredentialSource) {
        self.update_credentials(source.snapshot());
        let machine = Arc::downgrade(self);
        source.subscribe(move |context| {
            if let Some(live) = machine.upgrade() {
                live.update_credentials(context.clone());
            }
        });
    }

    /// Applies a credential snapshot. An identical snapshot is a no-op.
    pub fn update_credentials(&self, context: CredentialContext) {
        let changed = {
            let mut inner = self.lock();
            if inner.context == context {
                return;
            }
            let next = if context.is_configured() {
                AuthState::Configured
            } else {
                AuthState::NotConfigured
            };
            inner.context = context;
            inner.generation = inner.generation.wrapping_add(1);
            inner.session = None;
            inner.transition(next)
        };
        self.publish(changed);
    }

    /// Returns a validated or failed machine to [`AuthState::Configured`].
    pub fn reset(&self) {
        let changed = {
            let mut inner = self.lock();
            if matches!(inner.state, AuthState::NotConfigured | AuthState::Configured) {
                return;
            }
            inner.generation = inner.generation.wrapping_add(1);
            inner.session = None;
            inner.transition(AuthState::Configured)
        };
        self.publish(changed);
    }

    /// Validates identity, repository access, and discussions scope in
    /// order, stopping at the first failure. Returns the resulting state.
    ///
    /// Does nothing while [`AuthState::NotConfigured`] or while another
    /// validation is in flight.
    pub async fn validate(&self) -> AuthState {
        let (generation, context, changed) = {
            let mut inner = self.lock();
            if matches!(inner.state, AuthState::NotConfigured | AuthState::Validating) {
                tracing::debug!(state = inner.state.label(), "validation not started");
                return inner.state.clone();
            }
            inner.session = None;
            let changed = inner.transition(AuthState::Validating);
            (inner.generation, inner.context.clone(), changed)
        };
        self.publish(changed);

        let mut guard = ValidationGuard {
            machine: self,
            generation,
            finished: false,
        };
        let outcome = self.run_checks(&context).await;
        guard.finished = true;

        let (state, changed) = {
            let mut inner = self.lock();
            if inner.generation != generation {
                tracing::warn!(
                    generation,
                    current = inner.generation,
                    "discarding validation result for stale credentials"
                );
                return inner.state.clone();
            }
            let next = match outcome {
                Ok(session) => {
                    inner.session = Some(session);
                    AuthState::Valid
                }
                Err(reason) => AuthState::Invalid(reason),
            };
            let changed = inner.transition(next);
            (inner.state.clone(), changed)
        };
        self.publish(changed);
        state
    }

    async fn run_checks(&self, context: &CredentialContext) -> Result<AuthorizedSession, ApiError> {
        let token = context.personal_access_token()?;
        let repository = context.locator(&self.api_base)?;
        let gateway = self.connector.connect(&token, &self.api_base)?;

        gateway.validate_identity().await?;
        gateway.validate_repository_access(&repository).await?;
        gateway.validate_discussions_scope(&repository).await?;

        Ok(AuthorizedSession {
            gateway,
            repository,
        })
    }
}

/// Returns the machine to `Configured` if a validation future is dropped
/// before it finishes.
struct ValidationGuard<'a> {
    machine: &'a AuthStateMachine,
    generation: u64,
    finished: bool,
}

impl Drop for ValidationGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let changed = {
            let mut inner = self.machine.lock();
            if inner.generation != self.generation || inner.state != AuthState::Validating {
                return;
            }
            inner.transition(AuthState::Configured)
        };
        self.machine.publish(changed);
    }
}
