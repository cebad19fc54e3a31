//! Timing tests for the polling scheduler on a paused Tokio clock.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use mockall::Sequence;
use rstest::rstest;
use url::Url;

use super::PollingScheduler;
use crate::auth::{AuthState, AuthStateMachine};
use crate::credentials::CredentialContext;
use crate::events::SyncEvent;
use crate::events::test_support::RecordingEventSink;
use crate::github::models::test_support::discussions;
use crate::github::models::{Comment, DiscussionCategory, NewComment, NewDiscussion};
use crate::github::pagination::PageRequest;
use crate::github::{
    ApiError, Discussion, DiscussionGateway, MockDiscussionGateway, MockGatewayConnector, Page,
    PageCursor, PageInfo, PageSize, RepositoryLocator,
};
use crate::store::{DiscussionStore, LoadOutcome};

const INTERVAL: Duration = Duration::from_secs(60);

fn page(count: u64) -> Page<Discussion> {
    Page {
        items: discussions((1..=count).rev()),
        page_info: PageInfo::default(),
        total_count: count,
    }
}

/// Gateway whose successive discussion fetches return pages of the given
/// sizes, in order.
fn gateway_returning(sizes: &[u64]) -> MockDiscussionGateway {
    let mut gateway = MockDiscussionGateway::new();
    gateway.expect_validate_identity().returning(|| Ok(()));
    gateway
        .expect_validate_repository_access()
        .returning(|_| Ok(()));
    gateway
        .expect_validate_discussions_scope()
        .returning(|_| Ok(()));
    let mut sequence = Sequence::new();
    for &size in sizes {
        gateway
            .expect_fetch_discussions()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |_, _| Ok(page(size)));
    }
    gateway
}

/// Delegates to a mock, but every discussion fetch first waits `delay` on
/// the Tokio clock.
struct SlowGateway {
    inner: MockDiscussionGateway,
    delay: Duration,
}

#[async_trait]
impl DiscussionGateway for SlowGateway {
    async fn validate_identity(&self) -> Result<(), ApiError> {
        self.inner.validate_identity().await
    }

    async fn validate_repository_access(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<(), ApiError> {
        self.inner.validate_repository_access(repository).await
    }

    async fn validate_discussions_scope(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<(), ApiError> {
        self.inner.validate_discussions_scope(repository).await
    }

    async fn fetch_discussions(
        &self,
        repository: &RepositoryLocator,
        request: &PageRequest,
    ) -> Result<Page<Discussion>, ApiError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_discussions(repository, request).await
    }

    async fn fetch_comments(
        &self,
        repository: &RepositoryLocator,
        discussion_number: u64,
        request: &PageRequest,
    ) -> Result<Page<Comment>, ApiError> {
        self.inner
            .fetch_comments(repository, discussion_number, request)
            .await
    }

    async fn list_categories(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<Vec<DiscussionCategory>, ApiError> {
        self.inner.list_categories(repository).await
    }

    async fn create_discussion(
        &self,
        repository: &RepositoryLocator,
        discussion: &NewDiscussion,
    ) -> Result<Discussion, ApiError> {
        self.inner.create_discussion(repository, discussion).await
    }

    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, ApiError> {
        self.inner.add_comment(comment).await
    }
}

const fn slow(inner: MockDiscussionGateway, delay: Duration) -> SlowGateway {
    SlowGateway { inner, delay }
}

struct SchedulerHarness {
    auth: Arc<AuthStateMachine>,
    store: Arc<DiscussionStore>,
    scheduler: Arc<PollingScheduler>,
    events: Arc<RecordingEventSink>,
}

async fn harness(gateway: impl DiscussionGateway + 'static) -> SchedulerHarness {
    let shared: Arc<dyn DiscussionGateway> = Arc::new(gateway);
    let mut connector = MockGatewayConnector::new();
    connector
        .expect_connect()
        .returning(move |_, _| Ok(Arc::clone(&shared)));
    let auth = Arc::new(AuthStateMachine::new(
        Arc::new(connector),
        Url::parse("https://api.github.com").expect("API base should parse"),
    ));
    auth.update_credentials(CredentialContext::new("octo", "repo", "ghp_token"));
    assert_eq!(auth.validate().await, AuthState::Valid);

    let events = Arc::new(RecordingEventSink::default());
    let store = Arc::new(DiscussionStore::new(
        Arc::clone(&auth),
        Arc::clone(&events) as _,
        PageSize::default(),
    ));
    let scheduler = PollingScheduler::new(Arc::clone(&store), Arc::clone(&events) as _, INTERVAL);
    SchedulerHarness {
        auth,
        store,
        scheduler,
        events,
    }
}

fn new_discussion_events(events: &[SyncEvent]) -> Vec<SyncEvent> {
    events
        .iter()
        .filter(|event| matches!(event, SyncEvent::NewDiscussions { .. }))
        .cloned()
        .collect()
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn growth_is_announced_once_and_schedule_follows_tick_start() {
    let harness = harness(gateway_returning(&[3, 5, 5])).await;
    harness.store.refresh().await.expect("initial refresh should succeed");
    harness.scheduler.attach(&harness.auth);
    assert!(harness.scheduler.is_armed());
    assert_eq!(harness.scheduler.time_until_next_update(), Some(INTERVAL));

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

    assert_eq!(harness.store.len(), 5);
    assert_eq!(
        new_discussion_events(&harness.events.events()),
        vec![SyncEvent::NewDiscussions { count: 2 }]
    );
    assert_eq!(
        harness.scheduler.time_until_next_update(),
        Some(INTERVAL - Duration::from_secs(1))
    );
    assert!(harness.scheduler.last_update_time().is_some());

    tokio::time::sleep(INTERVAL).await;

    assert_eq!(
        new_discussion_events(&harness.events.events()),
        vec![SyncEvent::NewDiscussions { count: 2 }]
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn completed_poll_reports_collection_size() {
    let harness = harness(gateway_returning(&[2])).await;
    harness.scheduler.attach(&harness.auth);

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

    assert_eq!(
        harness.events.take(),
        vec![
            SyncEvent::NewDiscussions { count: 2 },
            SyncEvent::SyncCompleted {
                latency_ms: 0,
                discussion_count: 2,
            },
        ]
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn tick_is_skipped_while_refresh_in_flight_but_schedule_advances() {
    let harness = harness(gateway_returning(&[])).await;
    harness.scheduler.attach(&harness.auth);
    harness.scheduler.in_flight.store(true, Ordering::SeqCst);

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

    assert!(harness.events.take().is_empty());
    assert_eq!(harness.store.len(), 0);
    assert_eq!(
        harness.scheduler.time_until_next_update(),
        Some(INTERVAL - Duration::from_secs(1))
    );
    assert!(harness.scheduler.in_flight.load(Ordering::SeqCst));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn manual_update_rearms_from_now_without_delta_event() {
    let harness = harness(gateway_returning(&[4])).await;
    harness.scheduler.attach(&harness.auth);
    tokio::time::sleep(Duration::from_secs(30)).await;

    let outcome = harness
        .scheduler
        .manual_update()
        .await
        .expect("manual update should succeed");

    assert_eq!(outcome, LoadOutcome::Loaded { count: 4 });
    assert_eq!(harness.scheduler.time_until_next_update(), Some(INTERVAL));
    assert!(harness.scheduler.last_update_time().is_some());
    assert!(harness.events.take().is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn disabling_disarms_and_enabling_rearms() {
    let harness = harness(gateway_returning(&[])).await;
    harness.scheduler.attach(&harness.auth);

    harness.scheduler.enable(false);
    assert!(!harness.scheduler.is_armed());
    assert_eq!(harness.scheduler.next_update_time(), None);
    tokio::time::sleep(INTERVAL * 3).await;
    assert!(harness.events.take().is_empty());

    harness.scheduler.enable(true);
    assert!(harness.scheduler.is_armed());
    assert_eq!(harness.scheduler.time_until_next_update(), Some(INTERVAL));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn losing_configuration_disarms() {
    let harness = harness(gateway_returning(&[])).await;
    harness.scheduler.attach(&harness.auth);
    assert!(harness.scheduler.is_armed());

    harness
        .auth
        .update_credentials(CredentialContext::new("octo", "repo", ""));

    assert!(!harness.scheduler.is_armed());
    assert_eq!(harness.scheduler.time_until_next_update(), None);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn interval_change_restarts_timer() {
    let harness = harness(gateway_returning(&[])).await;
    harness.scheduler.attach(&harness.auth);
    tokio::time::sleep(Duration::from_secs(45)).await;

    harness
        .scheduler
        .set_interval(Duration::from_secs(120))
        .expect("interval should be accepted");

    assert_eq!(harness.scheduler.interval(), Duration::from_secs(120));
    assert_eq!(
        harness.scheduler.time_until_next_update(),
        Some(Duration::from_secs(120))
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn zero_interval_is_rejected() {
    let harness = harness(gateway_returning(&[])).await;

    let error = harness
        .scheduler
        .set_interval(Duration::ZERO)
        .expect_err("zero interval should fail");

    assert!(matches!(error, ApiError::Validation { .. }), "got {error:?}");
    assert_eq!(harness.scheduler.interval(), INTERVAL);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn next_deadline_counts_from_tick_start_not_completion() {
    let refresh_time = Duration::from_secs(10);
    let harness = harness(slow(gateway_returning(&[3, 5]), refresh_time)).await;
    harness.store.refresh().await.expect("initial refresh should succeed");
    harness.scheduler.attach(&harness.auth);

    // The tick starts at INTERVAL and its refresh completes 10s later.
    tokio::time::sleep(INTERVAL + refresh_time + Duration::from_secs(1)).await;

    assert_eq!(harness.store.len(), 5);
    assert_eq!(
        harness.scheduler.time_until_next_update(),
        Some(INTERVAL - refresh_time - Duration::from_secs(1))
    );
}

/// Change applied to the scheduler while a tick's refresh is running.
#[derive(Debug, Clone, Copy)]
enum Interruption {
    IntervalChange,
    Disable,
}

impl Interruption {
    fn apply(self, scheduler: &Arc<PollingScheduler>) {
        match self {
            Self::IntervalChange => scheduler
                .set_interval(Duration::from_secs(120))
                .expect("interval should be accepted"),
            Self::Disable => scheduler.enable(false),
        }
    }
}

#[rstest]
#[case::interval_change(Interruption::IntervalChange)]
#[case::disable(Interruption::Disable)]
#[tokio::test(start_paused = true)]
async fn running_refresh_survives_timer_changes(#[case] interruption: Interruption) {
    let refresh_time = Duration::from_secs(10);
    let harness = harness(slow(gateway_returning(&[3, 5]), refresh_time)).await;
    harness.store.refresh().await.expect("initial refresh should succeed");
    harness.scheduler.attach(&harness.auth);

    tokio::time::sleep(INTERVAL + Duration::from_secs(5)).await;
    assert!(harness.store.is_loading(), "tick refresh should be running");

    interruption.apply(&harness.scheduler);
    tokio::time::sleep(refresh_time).await;

    assert!(!harness.store.is_loading());
    assert_eq!(harness.store.len(), 5);
    assert_eq!(
        new_discussion_events(&harness.events.events()),
        vec![SyncEvent::NewDiscussions { count: 2 }]
    );
    assert!(harness.scheduler.last_update_time().is_some());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn tick_is_skipped_while_store_is_busy() {
    let load_time = Duration::from_secs(100);
    let mut gateway = MockDiscussionGateway::new();
    gateway.expect_validate_identity().returning(|| Ok(()));
    gateway
        .expect_validate_repository_access()
        .returning(|_| Ok(()));
    gateway
        .expect_validate_discussions_scope()
        .returning(|_| Ok(()));
    let mut sequence = Sequence::new();
    gateway
        .expect_fetch_discussions()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_, _| {
            Ok(Page {
                items: discussions([5, 4, 3]),
                page_info: PageInfo {
                    end_cursor: Some(PageCursor::new("c1")),
                    has_next: true,
                },
                total_count: 5,
            })
        });
    gateway
        .expect_fetch_discussions()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_, _| Ok(page(2)));
    let harness = harness(slow(gateway, load_time)).await;
    harness.store.refresh().await.expect("initial refresh should succeed");
    harness.scheduler.attach(&harness.auth);

    let store = Arc::clone(&harness.store);
    let load_more = tokio::spawn(async move { store.load_more().await });
    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

    assert!(harness.store.is_loading(), "load more should hold the gate");
    assert!(harness.events.take().is_empty());
    assert!(harness.scheduler.last_update_time().is_none());
    assert_eq!(
        harness.scheduler.time_until_next_update(),
        Some(INTERVAL - Duration::from_secs(1))
    );

    let outcome = load_more
        .await
        .expect("load more task should not panic")
        .expect("load more should succeed");
    assert_eq!(outcome, LoadOutcome::Loaded { count: 2 });
    assert_eq!(harness.store.len(), 5);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn update_is_due_until_a_refresh_succeeds_and_again_after_an_interval() {
    let harness = harness(gateway_returning(&[1])).await;
    assert!(!harness.scheduler.is_armed());
    assert!(harness.scheduler.is_update_due(), "never updated");

    harness
        .scheduler
        .manual_update()
        .await
        .expect("manual update should succeed");
    assert!(!harness.scheduler.is_update_due());

    harness.scheduler.enable(false);
    tokio::time::sleep(INTERVAL).await;

    assert!(harness.scheduler.is_update_due(), "interval has elapsed");
}
