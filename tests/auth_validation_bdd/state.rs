//! Scenario state for the credential validation BDD tests.

use std::sync::Arc;

use nooknote::{AuthState, AuthStateMachine, CredentialContext, OctocrabConnector};
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use wiremock::{Mock, MockServer};

use super::runtime::{SharedRuntime, ensure_runtime_and_server, mock_api_base};

#[derive(ScenarioState, Default)]
pub(crate) struct AuthScenarioState {
    pub(crate) runtime: Slot<SharedRuntime>,
    pub(crate) server: Slot<MockServer>,
    pub(crate) context: Slot<CredentialContext>,
    pub(crate) outcome: Slot<AuthState>,
}

fn runtime(state: &AuthScenarioState) -> SharedRuntime {
    ensure_runtime_and_server(&state.runtime, &state.server)
        .unwrap_or_else(|error| panic!("failed to start runtime and mock server: {error}"))
}

/// Mounts every mock on the scenario's server.
pub(crate) fn mount(state: &AuthScenarioState, mocks: Vec<Mock>) {
    let runtime = runtime(state);
    state
        .server
        .with_ref(|server| {
            for mock in mocks {
                runtime.block_on(mock.mount(server));
            }
        })
        .unwrap_or_else(|| panic!("mock server not initialised"));
}

/// Feeds the stored credentials to a fresh state machine and validates
/// them against the mock server.
pub(crate) fn run_validation(state: &AuthScenarioState) -> AuthState {
    let runtime = runtime(state);
    let api_base = mock_api_base(&state.server);
    let context = state
        .context
        .get()
        .unwrap_or_else(|| panic!("credentials missing"));

    let machine = Arc::new(AuthStateMachine::new(Arc::new(OctocrabConnector), api_base));
    machine.update_credentials(context);
    runtime.block_on(machine.validate())
}
