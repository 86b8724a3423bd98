//! Remote sync engine.
//!
//! Maps local edit intents onto remote calls and keeps the local event cache
//! consistent with the remote calendar. At most one operation is in flight at
//! a time; calls made while one is running, or while the session is not
//! authenticated, are dropped and report [`SyncOutcome::Skipped`].
//!
//! Every remote call runs through a bounded re-authentication loop: on
//! failure the session is marked unauthenticated, a fresh token is requested
//! and the call is retried, up to [`MAX_RETRIES`] times.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::classify::{BackgroundMode, Category, Classifier, Origin};
use crate::error::{CalPlanError, CalPlanResult};
use crate::event::CalendarEvent;
use crate::remote::{
    AccessToken, AuthProvider, CalendarService, EventQuery, TaskQuery, from_resource,
    task_to_event, to_resource,
};
use crate::split::split_event;

/// Retries after the first attempt. Total attempts are `1 + MAX_RETRIES`.
pub const MAX_RETRIES: usize = 2;

/// Days added on each side of a requested load window.
pub const WINDOW_PADDING_DAYS: i64 = 7;

/// Result of a gated operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome<T> {
    Applied(T),
    /// Dropped by the in-flight gate or because the session is logged out
    Skipped,
}

impl<T> SyncOutcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, SyncOutcome::Skipped)
    }

    pub fn applied(self) -> Option<T> {
        match self {
            SyncOutcome::Applied(value) => Some(value),
            SyncOutcome::Skipped => None,
        }
    }
}

/// Snapshot of the session flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSession {
    pub is_authenticated: bool,
    pub is_sync_in_flight: bool,
}

#[derive(Debug, Default)]
struct EngineState {
    token: Option<AccessToken>,
    cache: Vec<CalendarEvent>,
}

/// Releases the in-flight gate when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SyncEngine<S, A> {
    service: S,
    auth: A,
    classifier: Classifier,
    calendar_id: String,
    tasklist_id: Option<String>,
    authenticated: AtomicBool,
    in_flight: AtomicBool,
    state: Mutex<EngineState>,
}

impl<S: CalendarService, A: AuthProvider> SyncEngine<S, A> {
    pub fn new(service: S, auth: A, calendar_id: impl Into<String>) -> Self {
        SyncEngine {
            service,
            auth,
            classifier: Classifier::default(),
            calendar_id: calendar_id.into(),
            tasklist_id: None,
            authenticated: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
            state: Mutex::new(EngineState::default()),
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Include pending tasks from `tasklist_id` in every load.
    pub fn with_tasklist(mut self, tasklist_id: impl Into<String>) -> Self {
        self.tasklist_id = Some(tasklist_id.into());
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    pub fn session(&self) -> SyncSession {
        SyncSession {
            is_authenticated: self.authenticated.load(Ordering::Acquire),
            is_sync_in_flight: self.in_flight.load(Ordering::Acquire),
        }
    }

    /// Snapshot of the local event cache.
    pub async fn events(&self) -> Vec<CalendarEvent> {
        self.state.lock().await.cache.clone()
    }

    /// Authenticate with a persisted, unexpired token if one exists,
    /// otherwise ask the auth provider for a new one.
    pub async fn login(&self) -> CalPlanResult<()> {
        let token = match self.auth.persisted_token().filter(|t| !t.is_expired()) {
            Some(token) => {
                debug!("using persisted access token");
                token
            }
            None => self
                .auth
                .request_access_token()
                .await
                .map_err(into_auth_failed)?,
        };

        self.state.lock().await.token = Some(token);
        self.authenticated.store(true, Ordering::Release);
        info!(calendar = %self.calendar_id, "logged in");
        Ok(())
    }

    pub async fn logout(&self) -> CalPlanResult<()> {
        {
            let mut state = self.state.lock().await;
            state.token = None;
            state.cache.clear();
        }
        self.authenticated.store(false, Ordering::Release);
        self.auth.revoke()?;
        info!("logged out");
        Ok(())
    }

    /// Recompute every cached category after the background toggle changed.
    pub async fn reclassify(&self, mode: BackgroundMode) {
        let mut state = self.state.lock().await;
        for event in state.cache.iter_mut() {
            if event.category != Category::Task {
                event.category = self.classifier.classify(
                    &event.title,
                    event.explicit_background,
                    Origin::EventList,
                    mode,
                );
            }
        }
    }

    /// Replace the cache with all events overlapping the window padded by
    /// one week on each side, followed by pending tasks with a due date.
    ///
    /// Returns the number of cached entries.
    pub async fn load(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        mode: BackgroundMode,
    ) -> CalPlanResult<SyncOutcome<usize>> {
        if window_end <= window_start {
            return Err(CalPlanError::InvalidRange {
                start: window_start.to_rfc3339(),
                end: window_end.to_rfc3339(),
            });
        }
        let Some(_gate) = self.begin("load") else {
            return Ok(SyncOutcome::Skipped);
        };

        let padding = Duration::days(WINDOW_PADDING_DAYS);
        let query = EventQuery::window(window_start - padding, window_end + padding);
        let service = &self.service;
        let calendar_id = self.calendar_id.as_str();

        let resources = self
            .with_retry("list events", |token| {
                let query = &query;
                async move { service.list_events(&token, calendar_id, query).await }
            })
            .await?;

        let mut events = Vec::with_capacity(resources.len());
        for resource in resources {
            match from_resource(resource, &self.classifier, mode) {
                Ok(event) => events.push(event),
                Err(e) => warn!(error = %e, "skipping remote event"),
            }
        }

        if let Some(tasklist_id) = self.tasklist_id.as_deref() {
            let task_query = TaskQuery::default();
            let tasks = self
                .with_retry("list tasks", |token| {
                    let task_query = &task_query;
                    async move { service.list_tasks(&token, tasklist_id, task_query).await }
                })
                .await?;
            events.extend(tasks.into_iter().filter_map(task_to_event));
        }

        let count = events.len();
        self.state.lock().await.cache = events;
        debug!(count, %window_start, %window_end, "cache replaced");
        Ok(SyncOutcome::Applied(count))
    }

    /// Create `event` remotely and append the returned event to the cache.
    pub async fn create(
        &self,
        event: &CalendarEvent,
        mode: BackgroundMode,
    ) -> CalPlanResult<SyncOutcome<CalendarEvent>> {
        event.validate_range()?;
        let Some(_gate) = self.begin("create") else {
            return Ok(SyncOutcome::Skipped);
        };

        let created = self.remote_create(event, mode).await?;
        self.state.lock().await.cache.push(created.clone());
        info!(id = ?created.id, title = %created.title, "event created");
        Ok(SyncOutcome::Applied(created))
    }

    /// Write `event` to the remote event `id` and update the cached entry in
    /// place. Other cache entries are untouched.
    pub async fn update(
        &self,
        event: &CalendarEvent,
        id: &str,
        mode: BackgroundMode,
    ) -> CalPlanResult<SyncOutcome<()>> {
        event.validate_range()?;
        let Some(_gate) = self.begin("update") else {
            return Ok(SyncOutcome::Skipped);
        };

        let payload = to_resource(event);
        let service = &self.service;
        let calendar_id = self.calendar_id.as_str();
        self.with_retry("update event", |token| {
            let payload = &payload;
            async move { service.update_event(&token, calendar_id, id, payload).await }
        })
        .await?;

        let category =
            self.classifier
                .classify(&event.title, event.explicit_background, Origin::EventList, mode);
        let mut state = self.state.lock().await;
        match state.cache.iter_mut().find(|e| e.id.as_deref() == Some(id)) {
            Some(entry) => {
                entry.title = event.title.clone();
                entry.color_index = event.color_index;
                entry.description = event.description.clone();
                entry.category = category;
                entry.all_day = event.all_day;
                entry.start = event.start.normalized(event.all_day);
                entry.end = event.end.normalized(event.all_day);
                info!(id, "event updated");
            }
            None => debug!(id, "updated event is not cached"),
        }
        Ok(SyncOutcome::Applied(()))
    }

    /// Delete the remote event `id` and drop it from the cache.
    pub async fn delete(&self, id: &str) -> CalPlanResult<SyncOutcome<()>> {
        let Some(_gate) = self.begin("delete") else {
            return Ok(SyncOutcome::Skipped);
        };

        self.remote_delete(id).await?;
        self.state
            .lock()
            .await
            .cache
            .retain(|e| e.id.as_deref() != Some(id));
        info!(id, "event deleted");
        Ok(SyncOutcome::Applied(()))
    }

    /// Replace the remote event `id` with two events at a `percent`
    /// boundary of its duration.
    ///
    /// Remote order is delete, then both creates. Nothing is rolled back
    /// when a later step fails; the cache is only touched once all three
    /// calls succeeded.
    pub async fn split(
        &self,
        event: &CalendarEvent,
        id: &str,
        percent: f64,
        mode: BackgroundMode,
    ) -> CalPlanResult<SyncOutcome<(CalendarEvent, CalendarEvent)>> {
        let (first, second) = split_event(event, percent)?;
        let Some(_gate) = self.begin("split") else {
            return Ok(SyncOutcome::Skipped);
        };

        self.remote_delete(id)
            .await
            .map_err(|e| split_failed("deleting the original", e))?;
        let first = self
            .remote_create(&first, mode)
            .await
            .map_err(|e| split_failed("creating the first part", e))?;
        let second = self
            .remote_create(&second, mode)
            .await
            .map_err(|e| split_failed("creating the second part", e))?;

        let mut state = self.state.lock().await;
        state.cache.retain(|e| e.id.as_deref() != Some(id));
        state.cache.push(first.clone());
        state.cache.push(second.clone());
        info!(id, percent, "event split");
        Ok(SyncOutcome::Applied((first, second)))
    }

    /// Fetch one remote event without touching the cache.
    pub async fn fetch_event(
        &self,
        id: &str,
        mode: BackgroundMode,
    ) -> CalPlanResult<SyncOutcome<CalendarEvent>> {
        let Some(_gate) = self.begin("fetch") else {
            return Ok(SyncOutcome::Skipped);
        };

        let service = &self.service;
        let calendar_id = self.calendar_id.as_str();
        let resource = self
            .with_retry("get event", |token| async move {
                service.get_event(&token, calendar_id, id).await
            })
            .await?;
        let event = from_resource(resource, &self.classifier, mode)
            .map_err(|e| CalPlanError::SyncFailed(e.to_string()))?;
        Ok(SyncOutcome::Applied(event))
    }

    fn begin(&self, op: &'static str) -> Option<InFlight<'_>> {
        if !self.authenticated.load(Ordering::Acquire) {
            debug!(op, "not authenticated, dropping call");
            return None;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(op, "sync in flight, dropping call");
            return None;
        }
        Some(InFlight(&self.in_flight))
    }

    async fn remote_create(
        &self,
        event: &CalendarEvent,
        mode: BackgroundMode,
    ) -> CalPlanResult<CalendarEvent> {
        let payload = to_resource(event);
        let service = &self.service;
        let calendar_id = self.calendar_id.as_str();
        let resource = self
            .with_retry("create event", |token| {
                let payload = &payload;
                async move { service.insert_event(&token, calendar_id, payload).await }
            })
            .await?;
        from_resource(resource, &self.classifier, mode)
            .map_err(|e| CalPlanError::SyncFailed(e.to_string()))
    }

    async fn remote_delete(&self, id: &str) -> CalPlanResult<()> {
        let service = &self.service;
        let calendar_id = self.calendar_id.as_str();
        self.with_retry("delete event", |token| async move {
            service.delete_event(&token, calendar_id, id).await
        })
        .await
    }

    async fn with_retry<T, F, Fut>(&self, what: &str, mut call: F) -> CalPlanResult<T>
    where
        F: FnMut(AccessToken) -> Fut,
        Fut: Future<Output = CalPlanResult<T>>,
    {
        let Some(mut token) = self.state.lock().await.token.clone() else {
            self.authenticated.store(false, Ordering::Release);
            return Err(CalPlanError::AuthFailed("no access token".to_string()));
        };

        let mut retries = 0;
        loop {
            match call(token.clone()).await {
                Ok(value) => {
                    if retries > 0 {
                        self.authenticated.store(true, Ordering::Release);
                        info!(what, retries, "call succeeded after re-authentication");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    self.authenticated.store(false, Ordering::Release);
                    if retries >= MAX_RETRIES {
                        warn!(what, error = %e, "giving up after retries");
                        return Err(CalPlanError::SyncFailed(format!("{what}: {e}")));
                    }
                    retries += 1;
                    warn!(what, attempt = retries, error = %e, "remote call failed, re-authenticating");

                    token = self
                        .auth
                        .request_access_token()
                        .await
                        .map_err(into_auth_failed)?;
                    self.state.lock().await.token = Some(token.clone());
                }
            }
        }
    }
}

fn into_auth_failed(err: CalPlanError) -> CalPlanError {
    match err {
        CalPlanError::AuthFailed(_) => err,
        other => CalPlanError::AuthFailed(other.to_string()),
    }
}

fn split_failed(step: &str, err: CalPlanError) -> CalPlanError {
    CalPlanError::SyncFailed(format!("split stopped while {step}: {err}"))
}
