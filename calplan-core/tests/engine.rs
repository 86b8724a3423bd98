use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use calplan_core::{
    AccessToken, AuthProvider, BackgroundMode, CalPlanError, CalPlanResult, CalendarEvent,
    CalendarService, Category, EventQuery, EventResource, EventTemplate, EventTime, MemoryStore,
    NavigateDirection, SyncEngine, SyncOutcome, TaskQuery, TaskResource, TemplateStore,
};
use chrono::{NaiveDate, TimeZone, Utc};
use tokio::sync::Notify;

/// Records every call; `list_events` parks until released.
#[derive(Clone, Default)]
struct Remote {
    entered: Arc<Notify>,
    release: Arc<Notify>,
    park_list: bool,
    fail_next: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Remote {
    fn record(&self, call: String) -> CalPlanResult<()> {
        self.calls.lock().unwrap().push(call);
        let pending = self.fail_next.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next.store(pending - 1, Ordering::SeqCst);
            return Err(CalPlanError::Remote("401".into()));
        }
        Ok(())
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarService for Remote {
    async fn list_events(
        &self,
        _token: &AccessToken,
        _calendar_id: &str,
        _query: &EventQuery,
    ) -> CalPlanResult<Vec<EventResource>> {
        self.record("list".into())?;
        if self.park_list {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(Vec::new())
    }

    async fn insert_event(
        &self,
        _token: &AccessToken,
        _calendar_id: &str,
        event: &EventResource,
    ) -> CalPlanResult<EventResource> {
        self.record("insert".into())?;
        let mut created = event.clone();
        created.id = Some(format!("e{}", self.calls().len()));
        Ok(created)
    }

    async fn update_event(
        &self,
        _token: &AccessToken,
        _calendar_id: &str,
        event_id: &str,
        event: &EventResource,
    ) -> CalPlanResult<EventResource> {
        self.record(format!("update {event_id}"))?;
        Ok(event.clone())
    }

    async fn delete_event(
        &self,
        _token: &AccessToken,
        _calendar_id: &str,
        event_id: &str,
    ) -> CalPlanResult<()> {
        self.record(format!("delete {event_id}"))
    }

    async fn get_event(
        &self,
        _token: &AccessToken,
        _calendar_id: &str,
        event_id: &str,
    ) -> CalPlanResult<EventResource> {
        self.record(format!("get {event_id}"))?;
        Err(CalPlanError::Remote("404 Not Found".into()))
    }

    async fn list_tasks(
        &self,
        _token: &AccessToken,
        _tasklist_id: &str,
        _query: &TaskQuery,
    ) -> CalPlanResult<Vec<TaskResource>> {
        Ok(Vec::new())
    }
}

struct StaticAuth;

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn request_access_token(&self) -> CalPlanResult<AccessToken> {
        Ok(AccessToken::new("fresh"))
    }

    fn persisted_token(&self) -> Option<AccessToken> {
        Some(AccessToken::new("saved"))
    }
}

fn event_at(h: u32) -> CalendarEvent {
    CalendarEvent::new(
        "A",
        EventTime::zoned(Utc.with_ymd_and_hms(2025, 3, 20, h, 0, 0).unwrap(), "UTC"),
        EventTime::zoned(Utc.with_ymd_and_hms(2025, 3, 20, h + 1, 0, 0).unwrap(), "UTC"),
    )
    .with_color(2)
}

#[tokio::test]
async fn create_during_load_is_dropped_without_remote_call() {
    let remote = Remote {
        park_list: true,
        ..Default::default()
    };
    let engine = SyncEngine::new(remote.clone(), StaticAuth, "primary");
    engine.login().await.unwrap();
    let start = Utc.with_ymd_and_hms(2025, 3, 17, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 3, 24, 0, 0, 0).unwrap();

    let (loaded, created) = tokio::join!(
        engine.load(start, end, BackgroundMode::Locked),
        async {
            remote.entered.notified().await;
            assert!(engine.session().is_sync_in_flight);
            let outcome = engine.create(&event_at(10), BackgroundMode::Locked).await;
            remote.release.notify_one();
            outcome
        }
    );

    assert_eq!(loaded.unwrap(), SyncOutcome::Applied(0));
    assert!(created.unwrap().is_skipped());
    assert_eq!(remote.calls(), vec!["list"]);
    assert!(engine.events().await.is_empty());
    assert!(!engine.session().is_sync_in_flight);

    // Gate is clear again
    let outcome = engine.create(&event_at(10), BackgroundMode::Locked).await.unwrap();
    assert!(!outcome.is_skipped());
}

#[tokio::test]
async fn create_scenario_appends_interactive_event() {
    let remote = Remote::default();
    let engine = SyncEngine::new(remote.clone(), StaticAuth, "primary");
    engine.login().await.unwrap();

    engine.create(&event_at(10), BackgroundMode::Locked).await.unwrap();

    let cache = engine.events().await;
    assert_eq!(cache.len(), 1);
    assert_eq!(cache[0].id.as_deref(), Some("e1"));
    assert_eq!(cache[0].title, "A");
    assert_eq!(cache[0].color_index, 2);
    assert_eq!(cache[0].category, Category::Interactive);
}

#[tokio::test]
async fn single_failure_recovers_after_reauthentication() {
    let remote = Remote::default();
    let engine = SyncEngine::new(remote.clone(), StaticAuth, "primary");
    engine.login().await.unwrap();
    remote.fail_next.store(1, Ordering::SeqCst);

    engine.create(&event_at(10), BackgroundMode::Locked).await.unwrap();

    assert_eq!(remote.calls(), vec!["insert", "insert"]);
    assert_eq!(engine.events().await.len(), 1);
    assert!(engine.session().is_authenticated);
}

#[tokio::test]
async fn split_scenario_replaces_original_with_halves() {
    let remote = Remote::default();
    let engine = SyncEngine::new(remote.clone(), StaticAuth, "primary");
    engine.login().await.unwrap();
    let original = engine
        .create(&event_at(10), BackgroundMode::Locked)
        .await
        .unwrap()
        .applied()
        .unwrap();
    assert_eq!(original.id.as_deref(), Some("e1"));

    let (first, second) = engine
        .split(&original, "e1", 50.0, BackgroundMode::Locked)
        .await
        .unwrap()
        .applied()
        .unwrap();

    assert_eq!(remote.calls(), vec!["insert", "delete e1", "insert", "insert"]);
    assert_eq!(first.start.to_utc(), Utc.with_ymd_and_hms(2025, 3, 20, 10, 0, 0).unwrap());
    assert_eq!(first.end.to_utc(), Utc.with_ymd_and_hms(2025, 3, 20, 10, 30, 0).unwrap());
    assert_eq!(second.start.to_utc(), Utc.with_ymd_and_hms(2025, 3, 20, 10, 30, 0).unwrap());
    assert_eq!(second.end.to_utc(), Utc.with_ymd_and_hms(2025, 3, 20, 11, 0, 0).unwrap());

    let cache = engine.events().await;
    assert_eq!(cache.len(), 2);
    assert!(cache.iter().all(|e| e.id.as_deref() != Some("e1")));
}

#[tokio::test]
async fn fetch_of_missing_event_exhausts_retries() {
    let remote = Remote::default();
    let engine = SyncEngine::new(remote.clone(), StaticAuth, "primary");
    engine.login().await.unwrap();

    let err = engine.fetch_event("gone", BackgroundMode::Locked).await.unwrap_err();
    assert!(matches!(err, CalPlanError::SyncFailed(_)));
    assert_eq!(remote.calls().len(), 3);
    assert!(!engine.session().is_authenticated);
}

fn all_day_until(end: EventTime) -> CalendarEvent {
    let start = EventTime::date(NaiveDate::from_ymd_opt(2025, 3, 21).unwrap());
    let event = CalendarEvent::new("Offsite", start, end);
    assert!(event.all_day);
    event
}

#[tokio::test]
async fn all_day_create_is_checked_by_date() {
    let remote = Remote::default();
    let engine = SyncEngine::new(remote.clone(), StaticAuth, "primary");
    engine.login().await.unwrap();

    // Ends later on the same day: sent as start date == end date
    let same_day = all_day_until(EventTime::zoned(
        Utc.with_ymd_and_hms(2025, 3, 21, 15, 0, 0).unwrap(),
        "UTC",
    ));
    let err = engine.create(&same_day, BackgroundMode::Locked).await.unwrap_err();
    assert!(matches!(err, CalPlanError::InvalidRange { .. }));
    assert!(remote.calls().is_empty());
    assert!(engine.events().await.is_empty());

    let next_day = all_day_until(EventTime::zoned(
        Utc.with_ymd_and_hms(2025, 3, 22, 15, 0, 0).unwrap(),
        "UTC",
    ));
    let created = engine
        .create(&next_day, BackgroundMode::Locked)
        .await
        .unwrap()
        .applied()
        .unwrap();
    assert!(created.end.to_utc() > created.start.to_utc());
}

#[tokio::test]
async fn all_day_update_is_checked_by_date() {
    let remote = Remote::default();
    let engine = SyncEngine::new(remote.clone(), StaticAuth, "primary");
    engine.login().await.unwrap();
    let original = engine
        .create(&event_at(10), BackgroundMode::Locked)
        .await
        .unwrap()
        .applied()
        .unwrap();

    let mut edited = all_day_until(EventTime::zoned(
        Utc.with_ymd_and_hms(2025, 3, 21, 15, 0, 0).unwrap(),
        "UTC",
    ));
    edited.id = original.id.clone();

    let err = engine
        .update(&edited, "e1", BackgroundMode::Locked)
        .await
        .unwrap_err();
    assert!(matches!(err, CalPlanError::InvalidRange { .. }));
    assert_eq!(remote.calls(), vec!["insert"]);
    assert_eq!(engine.events().await, vec![original]);
}

#[test]
fn template_navigation_reorders_list() {
    let mut store = TemplateStore::load(MemoryStore::new());
    for title in ["A", "B", "C"] {
        let mut template = EventTemplate::from_event(&event_at(9));
        template.title = title.to_string();
        store.add(template).unwrap();
    }

    store.select(1).unwrap();
    store.select_navigate(NavigateDirection::Next).unwrap();

    let titles: Vec<_> = store.templates().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["A", "C", "B"]);
    assert_eq!(store.selected_index(), Some(2));
}
