//! Support modules for the discussion sync BDD tests.

pub(crate) mod domain;
#[path = "../support/github_mocks.rs"]
pub(crate) mod github_mocks;
#[path = "../support/runtime.rs"]
pub(crate) mod runtime;
pub(crate) mod state;

pub(crate) use domain::DiscussionNumbers;
pub(crate) use state::{SyncState, mount, run, start_session, store};
