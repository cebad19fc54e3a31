//! Scenario state for the discussion sync BDD tests.

use std::sync::Arc;

use nooknote::events::test_support::RecordingEventSink;
use nooknote::{
    ApiError, AuthState, AuthStateMachine, CredentialContext, DiscussionStore, OctocrabConnector,
    PageSize,
};
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use wiremock::{Mock, MockServer};

use super::runtime::{SharedRuntime, ensure_runtime_and_server, mock_api_base};

#[derive(ScenarioState, Default)]
pub(crate) struct SyncState {
    pub(crate) runtime: Slot<SharedRuntime>,
    pub(crate) server: Slot<MockServer>,
    pub(crate) store: Slot<Arc<DiscussionStore>>,
    pub(crate) events: Slot<Arc<RecordingEventSink>>,
    pub(crate) error: Slot<ApiError>,
}

pub(crate) fn runtime(state: &SyncState) -> SharedRuntime {
    ensure_runtime_and_server(&state.runtime, &state.server)
        .unwrap_or_else(|error| panic!("failed to start runtime and mock server: {error}"))
}

/// Mounts `mock` on the scenario's server.
pub(crate) fn mount(state: &SyncState, mock: Mock) {
    let runtime = runtime(state);
    state
        .server
        .with_ref(|server| runtime.block_on(mock.mount(server)))
        .unwrap_or_else(|| panic!("mock server not initialised"));
}

/// Validates credentials against the mock server and builds a store on the
/// resulting machine, returning the validation outcome.
pub(crate) fn start_session(state: &SyncState, owner: &str, repo: &str) -> AuthState {
    let runtime = runtime(state);
    let api_base = mock_api_base(&state.server);

    let auth = Arc::new(AuthStateMachine::new(Arc::new(OctocrabConnector), api_base));
    auth.update_credentials(CredentialContext::new(owner, repo, "ghp_valid"));
    let outcome = runtime.block_on(auth.validate());

    let events = Arc::new(RecordingEventSink::default());
    let store = Arc::new(DiscussionStore::new(
        auth,
        Arc::clone(&events) as _,
        PageSize::default(),
    ));
    state.store.set(store);
    state.events.set(events);
    outcome
}

pub(crate) fn store(state: &SyncState) -> Arc<DiscussionStore> {
    state
        .store
        .get()
        .unwrap_or_else(|| panic!("store not initialised"))
}

/// Runs `operation` against the store, remembering any failure.
pub(crate) fn run<T, F>(state: &SyncState, operation: impl FnOnce(Arc<DiscussionStore>) -> F)
where
    F: std::future::Future<Output = Result<T, ApiError>>,
{
    let runtime = runtime(state);
    if let Err(error) = runtime.block_on(operation(store(state))) {
        state.error.set(error);
    }
}
