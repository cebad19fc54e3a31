//! `NookNote` library crate keeping a GitHub Discussions feed in sync.
//!
//! Credentials flow from a [`CredentialSource`] into the
//! [`AuthStateMachine`], which validates them against GitHub through a
//! [`DiscussionGateway`]. A validated session backs the
//! [`DiscussionStore`], and the [`PollingScheduler`] refreshes that store in
//! the background, announcing growth through an [`EventSink`].

pub mod auth;
pub mod config;
pub mod credentials;
pub mod events;
pub mod github;
pub mod scheduler;
pub mod store;

pub use auth::{AuthState, AuthStateMachine, AuthorizedSession};
pub use config::{NookNoteConfig, OperationMode};
pub use credentials::{CredentialContext, CredentialSource};
pub use events::{EventSink, NoopEventSink, StderrJsonlEventSink, SyncEvent};
pub use github::{
    ApiError, Comment, CommentId, Discussion, DiscussionCategory, DiscussionGateway, DiscussionId,
    GatewayConnector, OctocrabConnector, OctocrabDiscussionGateway, PageCursor, PageSize,
    RepositoryLocator,
};
pub use scheduler::{DEFAULT_POLL_INTERVAL, PollingScheduler};
pub use store::{DiscussionSnapshot, DiscussionStore, LoadOutcome};
