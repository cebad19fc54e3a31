//! Sync events, event sinks, and change listeners.
//!
//! The scheduler and store report noteworthy outcomes through an injected
//! [`EventSink`]. State observers use `subscribe` callbacks instead, which are
//! stored in a [`Listeners`] list and invoked synchronously.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// A structured event emitted by the sync core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A background poll found discussions that were not there before.
    NewDiscussions {
        /// How many more discussions the collection holds than before the poll.
        count: usize,
    },
    /// A discussion was created through the store.
    DiscussionPosted {
        /// Number of the created discussion.
        number: u64,
    },
    /// A background poll finished successfully.
    SyncCompleted {
        /// Wall time of the refresh in milliseconds.
        latency_ms: u64,
        /// Collection size after the refresh.
        discussion_count: usize,
    },
}

/// A sink that can record sync events.
pub trait EventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: SyncEvent);
}

/// Event sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record(&self, _event: SyncEvent) {}
}

/// Records events to stderr as JSON lines (JSONL).
#[derive(Debug, Default)]
pub struct StderrJsonlEventSink;

impl EventSink for StderrJsonlEventSink {
    fn record(&self, event: SyncEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Synchronous listener list.
///
/// Callbacks run on the notifying thread after the list lock is released, so
/// a callback may subscribe further listeners.
pub(crate) struct Listeners<T> {
    callbacks: Mutex<Vec<Callback<T>>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Listeners<T> {
    pub(crate) fn add(&self, callback: impl Fn(&T) + Send + Sync + 'static) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(callback));
    }

    pub(crate) fn notify(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for callback in callbacks {
            callback(value);
        }
    }
}

/// Recording sink for tests.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::sync::{Mutex, PoisonError};

    use super::{EventSink, SyncEvent};

    /// Event sink that keeps every event in memory.
    #[derive(Debug, Default)]
    pub struct RecordingEventSink {
        events: Mutex<Vec<SyncEvent>>,
    }

    impl RecordingEventSink {
        /// Returns and clears the recorded events.
        #[must_use]
        pub fn take(&self) -> Vec<SyncEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain(..)
                .collect()
        }

        /// Returns a copy of the recorded events.
        #[must_use]
        pub fn events(&self) -> Vec<SyncEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl EventSink for RecordingEventSink {
        fn record(&self, event: SyncEvent) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        }
    }
}
