//! Background polling that refreshes the store and announces new discussions.
//!
//! While armed, a spawned Tokio task owns the repeating timer. Each tick
//! computes its successor as `tick start + interval` before doing any work,
//! so skipped or slow ticks never shift the schedule. The refresh itself runs
//! in a separate task, so disarming or re-timing only stops the sleeping
//! timer and a request already sent is allowed to finish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::auth::AuthStateMachine;
use crate::events::{EventSink, SyncEvent};
use crate::github::ApiError;
use crate::store::{DiscussionStore, LoadOutcome};

#[cfg(test)]
mod tests;

/// Interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct SchedulerState {
    enabled: bool,
    configured: bool,
    interval: Duration,
    task: Option<JoinHandle<()>>,
    next_deadline: Option<Instant>,
    last_update: Option<DateTime<Utc>>,
    last_update_at: Option<Instant>,
}

/// Clears the in-flight flag on drop.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        (!flag.swap(true, Ordering::AcqRel)).then_some(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Repeating refresh driver for a [`DiscussionStore`].
pub struct PollingScheduler {
    store: Arc<DiscussionStore>,
    events: Arc<dyn EventSink>,
    in_flight: AtomicBool,
    state: Mutex<SchedulerState>,
}

impl PollingScheduler {
    /// Creates a disarmed scheduler. It arms once it is enabled and the
    /// credentials are configured. A zero interval falls back to
    /// [`DEFAULT_POLL_INTERVAL`].
    #[must_use]
    pub fn new(
        store: Arc<DiscussionStore>,
        events: Arc<dyn EventSink>,
        interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            events,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(SchedulerState {
                enabled: true,
                configured: false,
                interval: if interval.is_zero() {
                    DEFAULT_POLL_INTERVAL
                } else {
                    interval
                },
                task: None,
                next_deadline: None,
                last_update: None,
                last_update_at: None,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Follows the machine's configured/not-configured transitions.
    pub fn attach(self: &Arc<Self>, auth: &AuthStateMachine) {
        self.set_configured(auth.state().is_configured());
        let scheduler = Arc::downgrade(self);
        auth.subscribe(move |state| {
            if let Some(live) = scheduler.upgrade() {
                live.set_configured(state.is_configured());
            }
        });
    }

    /// Marks the credentials as configured or not, arming or disarming.
    pub fn set_configured(self: &Arc<Self>, configured: bool) {
        {
            let mut state = self.lock();
            if state.configured == configured {
                return;
            }
            state.configured = configured;
        }
        self.rearm(Instant::now());
    }

    /// Enables or disables automatic polling.
    pub fn enable(self: &Arc<Self>, enabled: bool) {
        {
            let mut state = self.lock();
            if state.enabled == enabled {
                return;
            }
            state.enabled = enabled;
        }
        self.rearm(Instant::now());
    }

    /// Changes the polling interval and restarts the timer from now.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a zero interval.
    pub fn set_interval(self: &Arc<Self>, interval: Duration) -> Result<(), ApiError> {
        if interval.is_zero() {
            return Err(ApiError::validation("poll interval must be positive"));
        }
        self.lock().interval = interval;
        self.rearm(Instant::now());
        Ok(())
    }

    /// Current polling interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.lock().interval
    }

    /// Whether automatic polling is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Whether a timer task is running.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.lock().task.is_some()
    }

    /// Time of the last successful refresh driven by this scheduler.
    #[must_use]
    pub fn last_update_time(&self) -> Option<DateTime<Utc>> {
        self.lock().last_update
    }

    /// Wall-clock time of the next tick, if armed.
    #[must_use]
    pub fn next_update_time(&self) -> Option<DateTime<Utc>> {
        let remaining = chrono::Duration::from_std(self.time_until_next_update()?).ok()?;
        Utc::now().checked_add_signed(remaining)
    }

    /// Time left until the next tick, if armed; zero once due.
    #[must_use]
    pub fn time_until_next_update(&self) -> Option<Duration> {
        let deadline = self.lock().next_deadline?;
        Some(deadline.saturating_duration_since(Instant::now()))
    }

    /// True when no refresh has succeeded yet, or a full interval has
    /// passed since the last one. Independent of whether the timer is armed.
    #[must_use]
    pub fn is_update_due(&self) -> bool {
        let state = self.lock();
        state
            .last_update_at
            .is_none_or(|at| at.elapsed() >= state.interval)
    }

    /// Refreshes now and restarts the timer from this moment.
    ///
    /// Emits no [`SyncEvent::NewDiscussions`]; the caller asked for the
    /// update and sees its result directly.
    ///
    /// # Errors
    ///
    /// Returns the store's refresh failure.
    pub async fn manual_update(self: &Arc<Self>) -> Result<LoadOutcome, ApiError> {
        let outcome = {
            let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
                tracing::debug!("manual update skipped; a refresh is in flight");
                return Ok(LoadOutcome::Skipped);
            };
            self.store.refresh().await
        };

        if matches!(outcome, Ok(LoadOutcome::Loaded { .. })) {
            self.mark_updated();
        }
        self.rearm(Instant::now());
        outcome
    }

    /// Runs one scheduled tick.
    async fn poll_once(&self) {
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!("poll skipped; a refresh is in flight");
            return;
        };
        if self.store.is_loading() {
            tracing::debug!("poll skipped; the store is busy");
            return;
        }

        let before = self.store.len();
        let started = Instant::now();
        match self.store.refresh().await {
            Ok(LoadOutcome::Loaded { .. }) => {
                self.mark_updated();
                let after = self.store.len();
                tracing::info!(before, after, "background poll finished");
                if after > before {
                    self.events.record(SyncEvent::NewDiscussions {
                        count: after - before,
                    });
                }
                self.events.record(SyncEvent::SyncCompleted {
                    latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    discussion_count: after,
                });
            }
            Ok(LoadOutcome::Skipped) => tracing::debug!("poll skipped by the store"),
            Err(error) => tracing::warn!("background poll failed: {error}"),
        }
    }

    fn mark_updated(&self) {
        let mut state = self.lock();
        state.last_update = Some(Utc::now());
        state.last_update_at = Some(Instant::now());
    }

    /// Aborts any running timer and, when enabled and configured, spawns a
    /// new one whose first deadline is `from + interval`.
    fn rearm(self: &Arc<Self>, from: Instant) {
        let mut state = self.lock();
        if let Some(task) = state.task.take() {
            task.abort();
        }
        state.next_deadline = None;

        if !(state.enabled && state.configured) {
            tracing::debug!("polling scheduler disarmed");
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("no Tokio runtime available; polling scheduler stays disarmed");
            return;
        };
        let deadline = from + state.interval;
        state.task = Some(runtime.spawn(run_timer(Arc::downgrade(self), deadline)));
        state.next_deadline = Some(deadline);
        tracing::debug!(interval_secs = state.interval.as_secs(), "polling scheduler armed");
    }
}

async fn run_timer(scheduler: Weak<PollingScheduler>, first_deadline: Instant) {
    let mut deadline = first_deadline;
    loop {
        tokio::time::sleep_until(deadline).await;
        let Some(live) = scheduler.upgrade() else {
            return;
        };
        let tick_start = Instant::now();
        {
            let mut state = live.lock();
            deadline = tick_start + state.interval;
            state.next_deadline = Some(deadline);
        }
        tokio::spawn(async move { live.poll_once().await });
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.lock().task.take() {
            task.abort();
        }
    }
}
