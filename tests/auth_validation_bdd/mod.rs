//! Support modules for the credential validation BDD tests.

#[path = "../support/github_mocks.rs"]
pub(crate) mod github_mocks;
#[path = "../support/runtime.rs"]
pub(crate) mod runtime;
pub(crate) mod state;

pub(crate) use state::{AuthScenarioState, mount, run_validation};
