//! Tokio runtime and Wiremock server shared by the steps of one scenario.

use std::io;
use std::rc::Rc;

use rstest_bdd::Slot;
use tokio::runtime::Runtime;
use url::Url;
use wiremock::MockServer;

/// Cloneable runtime handle that can live in an `rstest-bdd` Slot.
#[derive(Clone)]
pub struct SharedRuntime(Rc<Runtime>);

impl SharedRuntime {
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.0.block_on(future)
    }
}

/// Starts the runtime and mock server on first use and returns the runtime.
///
/// # Errors
///
/// Returns an error if the Tokio runtime cannot be created.
pub fn ensure_runtime_and_server(
    runtime: &Slot<SharedRuntime>,
    server: &Slot<MockServer>,
) -> Result<SharedRuntime, io::Error> {
    let shared = match runtime.get() {
        Some(existing) => existing,
        None => {
            let created = SharedRuntime(Rc::new(Runtime::new()?));
            runtime.set(created.clone());
            created
        }
    };

    if server.with_ref(|_| ()).is_none() {
        server.set(shared.block_on(MockServer::start()));
    }

    Ok(shared)
}

/// API base pointing at the scenario's mock server.
///
/// # Panics
///
/// Panics when the server has not been started.
pub fn mock_api_base(server: &Slot<MockServer>) -> Url {
    server
        .with_ref(|started| Url::parse(&started.uri()))
        .unwrap_or_else(|| panic!("mock server not initialised"))
        .unwrap_or_else(|error| panic!("mock server URI should parse: {error}"))
}
