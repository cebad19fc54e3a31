//! Ordered, de-duplicated local view of a repository's discussions.
//!
//! Refresh, load-more, and create share one busy gate: a second operation is
//! refused while the first is outstanding, never queued. The gate is released
//! by a guard, so a dropped future cannot leave the store stuck in `loading`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::auth::{AuthStateMachine, AuthorizedSession};
use crate::events::{EventSink, Listeners, SyncEvent};
use crate::github::{
    ApiError, Comment, CommentId, Discussion, DiscussionCategory, DiscussionId, NewComment,
    NewDiscussion, Page, PageCursor, PageInfo, PageRequest, PageSize,
};


/// Read-only copy of the store state handed to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscussionSnapshot {
    /// Discussions, most recently updated first.
    pub discussions: Vec<Discussion>,
    /// Whether another page can be loaded.
    pub has_more: bool,
    /// Whether an operation holds the busy gate.
    pub loading: bool,
    /// Failure recorded by the last operation.
    pub last_error: Option<ApiError>,
}

/// Result of a refresh or load-more request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was fetched and applied.
    Loaded {
        /// Number of discussions the page added to the collection.
        count: usize,
    },
    /// Nothing was fetched: the gate was held or no further page exists.
    Skipped,
}

#[derive(Debug, Default)]
struct StoreState {
    discussions: Vec<Discussion>,
    cursor: Option<PageCursor>,
    has_more: bool,
    loading: bool,
    last_error: Option<ApiError>,
}

impl StoreState {
    fn snapshot(&self) -> DiscussionSnapshot {
        DiscussionSnapshot {
            discussions: self.discussions.clone(),
            has_more: self.has_more,
            loading: self.loading,
            last_error: self.last_error.clone(),
        }
    }

    /// A page that claims a successor but carries no cursor ends pagination.
    fn apply_page_info(&mut self, page_info: &PageInfo) {
        self.cursor = page_info.next_cursor().cloned();
        self.has_more = self.cursor.is_some();
    }
}

/// Releases the busy gate on drop.
struct LoadingGuard<'a> {
    store: &'a DiscussionStore,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.mutate(|state| state.loading = false);
    }
}

/// Discussion collection backed by the authorised gateway.
pub struct DiscussionStore {
    auth: Arc<AuthStateMachine>,
    events: Arc<dyn EventSink>,
    page_size: PageSize,
    state: Mutex<StoreState>,
    listeners: Listeners<DiscussionSnapshot>,
}

impl DiscussionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(
        auth: Arc<AuthStateMachine>,
        events: Arc<dyn EventSink>,
        page_size: PageSize,
    ) -> Self {
        Self {
            auth,
            events,
            page_size,
            state: Mutex::new(StoreState::default()),
            listeners: Listeners::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `change` and notifies subscribers with the result.
    fn mutate<R>(&self, change: impl FnOnce(&mut StoreState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.lock();
            let result = change(&mut state);
            (result, state.snapshot())
        };
        self.listeners.notify(&snapshot);
        result
    }

    /// Takes the gate when `ready` holds for the current state.
    fn try_begin(&self, ready: impl FnOnce(&StoreState) -> bool) -> Option<LoadingGuard<'_>> {
        let acquired = self.mutate(|state| {
            if state.loading || !ready(state) {
                return false;
            }
            state.loading = true;
            state.last_error = None;
            true
        });
        acquired.then_some(LoadingGuard { store: self })
    }

    fn record_error(&self, error: ApiError) -> ApiError {
        tracing::debug!("discussion store recorded error: {error}");
        self.mutate(|state| state.last_error = Some(error.clone()));
        error
    }

    /// Fetches the first page and replaces the collection.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotAuthenticated`] unless authentication is
    /// valid, or the gateway failure. Either way the collection is kept and
    /// the error is recorded.
    pub async fn refresh(&self) -> Result<LoadOutcome, ApiError> {
        let Some(guard) = self.try_begin(|_| true) else {
            tracing::debug!("refresh skipped; another operation is in flight");
            return Ok(LoadOutcome::Skipped);
        };
        let session = self.auth.authorized().map_err(|error| self.record_error(error))?;

        let request = PageRequest::first(self.page_size);
        let Page {
            items, page_info, ..
        } = session
            .gateway()
            .fetch_discussions(session.repository(), &request)
            .await
            .map_err(|error| self.record_error(error))?;

        let count = items.len();
        self.mutate(|state| {
            state.discussions = items;
            state.apply_page_info(&page_info);
        });
        drop(guard);

        tracing::info!(count, "discussions refreshed");
        Ok(LoadOutcome::Loaded { count })
    }

    /// Fetches the next page and appends it.
    ///
    /// Skipped without any network call while loading or when no further
    /// page exists. Discussions already present are dropped.
    ///
    /// # Errors
    ///
    /// Returns the authentication or gateway failure, which is also
    /// recorded.
    pub async fn load_more(&self) -> Result<LoadOutcome, ApiError> {
        let Some(guard) = self.try_begin(|state| state.has_more) else {
            return Ok(LoadOutcome::Skipped);
        };
        let session = self.auth.authorized().map_err(|error| self.record_error(error))?;

        let request = PageRequest {
            page_size: self.page_size,
            after: self.lock().cursor.clone(),
        };
        let Page {
            items, page_info, ..
        } = session
            .gateway()
            .fetch_discussions(session.repository(), &request)
            .await
            .map_err(|error| self.record_error(error))?;

        let count = self.mutate(|state| {
            let before = state.discussions.len();
            append_unique(&mut state.discussions, items);
            state.apply_page_info(&page_info);
            state.discussions.len().saturating_sub(before)
        });
        drop(guard);

        Ok(LoadOutcome::Loaded { count })
    }

    /// Creates a discussion and prepends it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a blank title or category without
    /// any network call, [`ApiError::Busy`] while another operation holds the
    /// gate, or the authentication or gateway failure. Failures other than
    /// `Busy` are recorded and leave the collection untouched.
    pub async fn create(
        &self,
        title: &str,
        body: &str,
        category: &str,
    ) -> Result<Discussion, ApiError> {
        if title.trim().is_empty() {
            return Err(self.record_error(ApiError::validation(
                "discussion title must not be blank",
            )));
        }
        if category.trim().is_empty() {
            return Err(self.record_error(ApiError::validation(
                "discussion category must not be blank",
            )));
        }
        let Some(guard) = self.try_begin(|_| true) else {
            return Err(ApiError::Busy);
        };
        let session = self.auth.authorized().map_err(|error| self.record_error(error))?;

        let request = NewDiscussion {
            title: title.trim().to_owned(),
            body: body.to_owned(),
            category: category.trim().to_owned(),
        };
        let created = session
            .gateway()
            .create_discussion(session.repository(), &request)
            .await
            .map_err(|error| self.record_error(error))?;

        self.mutate(|state| {
            state.discussions.retain(|existing| existing.id != created.id);
            state.discussions.insert(0, created.clone());
        });
        drop(guard);

        tracing::info!(number = created.number, "discussion created");
        self.events.record(SyncEvent::DiscussionPosted {
            number: created.number,
        });
        Ok(created)
    }

    fn session(&self) -> Result<AuthorizedSession, ApiError> {
        self.auth.authorized()
    }

    /// Fetches the first page of a discussion's comments.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotAuthenticated`] or the gateway failure.
    pub async fn fetch_comments(
        &self,
        discussion: &Discussion,
    ) -> Result<Page<Comment>, ApiError> {
        self.fetch_comments_page(discussion, None).await
    }

    /// Fetches the comment page after `cursor`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotAuthenticated`] or the gateway failure.
    pub async fn fetch_comments_page(
        &self,
        discussion: &Discussion,
        cursor: Option<PageCursor>,
    ) -> Result<Page<Comment>, ApiError> {
        let session = self.session()?;
        let request = PageRequest {
            page_size: self.page_size,
            after: cursor,
        };
        session
            .gateway()
            .fetch_comments(session.repository(), discussion.number, &request)
            .await
    }

    /// Adds a top-level comment.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a blank body without any network
    /// call, [`ApiError::NotAuthenticated`], or the gateway failure.
    pub async fn add_comment(
        &self,
        discussion_id: &DiscussionId,
        body: &str,
    ) -> Result<Comment, ApiError> {
        self.post_comment(discussion_id, body, None).await
    }

    /// Replies to an existing comment.
    ///
    /// # Errors
    ///
    /// As for [`add_comment`](Self::add_comment).
    pub async fn reply_to_comment(
        &self,
        discussion_id: &DiscussionId,
        parent: &CommentId,
        body: &str,
    ) -> Result<Comment, ApiError> {
        self.post_comment(discussion_id, body, Some(parent.clone()))
            .await
    }

    async fn post_comment(
        &self,
        discussion_id: &DiscussionId,
        body: &str,
        reply_to: Option<CommentId>,
    ) -> Result<Comment, ApiError> {
        if body.trim().is_empty() {
            return Err(ApiError::validation("comment body must not be blank"));
        }
        let session = self.session()?;
        session
            .gateway()
            .add_comment(&NewComment {
                discussion_id: discussion_id.clone(),
                body: body.to_owned(),
                reply_to,
            })
            .await
    }

    /// Lists the repository's discussion categories.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotAuthenticated`] or the gateway failure.
    pub async fn categories(&self) -> Result<Vec<DiscussionCategory>, ApiError> {
        let session = self.session()?;
        session.gateway().list_categories(session.repository()).await
    }

    /// Finds a loaded discussion by number.
    #[must_use]
    pub fn discussion_by_number(&self, number: u64) -> Option<Discussion> {
        self.lock()
            .discussions
            .iter()
            .find(|discussion| discussion.number == number)
            .cloned()
    }

    /// Clears the recorded error.
    pub fn clear_error(&self) {
        self.mutate(|state| state.last_error = None);
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> DiscussionSnapshot {
        self.lock().snapshot()
    }

    /// Number of loaded discussions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().discussions.len()
    }

    /// True when nothing is loaded and nothing is loading.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let state = self.lock();
        state.discussions.is_empty() && !state.loading
    }

    /// Whether an operation holds the busy gate.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// Failure recorded by the last operation.
    #[must_use]
    pub fn last_error(&self) -> Option<ApiError> {
        self.lock().last_error.clone()
    }

    /// Registers `callback` for every state change.
    pub fn subscribe(&self, callback: impl Fn(&DiscussionSnapshot) + Send + Sync + 'static) {
        self.listeners.add(callback);
    }
}

/// Appends `fetched`, dropping discussions whose id is already present.
fn append_unique(discussions: &mut Vec<Discussion>, fetched: Vec<Discussion>) {
    let mut seen: HashSet<DiscussionId> = discussions
        .iter()
        .map(|discussion| discussion.id.clone())
        .collect();
    for discussion in fetched {
        if seen.insert(discussion.id.clone()) {
            discussions.push(discussion);
        } else {
            tracing::warn!(
                id = %discussion.id,
                number = discussion.number,
                "dropping duplicate discussion from later page"
            );
        }
    }
}
