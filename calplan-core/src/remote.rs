//! Boundary to the remote calendar/task service and its auth provider.
//!
//! Resources mirror the JSON shapes of the remote API (`id`, `summary`,
//! `description`, `start{date|dateTime,timeZone}`, `end{...}`, `colorId`).
//! Implementations live in provider crates; the sync engine receives them
//! at construction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{BackgroundMode, Category, Classifier, Origin};
use crate::error::{CalPlanError, CalPlanResult};
use crate::event::{CalendarEvent, EventTime};
use crate::palette::{
    DEFAULT_COLOR_INDEX, palette_index_to_remote_color, remote_color_to_palette_index,
};

/// Bearer token for the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        AccessToken {
            access_token: access_token.into(),
            refresh_token: String::new(),
            expires_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }
}

/// `{date}` or `{dateTime, timeZone}` as sent to and received from the
/// remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    pub fn all_day(date: NaiveDate) -> Self {
        EventDateTime {
            date: Some(date),
            ..Default::default()
        }
    }

    pub fn timed(date_time: DateTime<Utc>, time_zone: impl Into<String>) -> Self {
        EventDateTime {
            date: None,
            date_time: Some(date_time),
            time_zone: Some(time_zone.into()),
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.date.is_some() && self.date_time.is_none()
    }

    /// Timed values win over dates; `None` when neither is present.
    pub fn to_event_time(&self) -> Option<EventTime> {
        match (self.date_time, self.date) {
            (Some(date_time), _) => Some(EventTime::DateTime {
                date_time,
                time_zone: self.time_zone.clone().filter(|tz| !tz.is_empty()),
            }),
            (None, Some(date)) => Some(EventTime::date(date)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    /// Explicit background display flag, when the service carries one
    #[serde(default)]
    pub background: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResource {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Event list query. `single_events` expands recurring events into
/// instances ordered by start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
    pub single_events: bool,
    pub show_deleted: bool,
}

impl EventQuery {
    pub fn window(time_min: DateTime<Utc>, time_max: DateTime<Utc>) -> Self {
        EventQuery {
            time_min,
            time_max,
            single_events: true,
            show_deleted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub show_completed: bool,
    pub show_deleted: bool,
    pub show_due: bool,
}

impl Default for TaskQuery {
    fn default() -> Self {
        TaskQuery {
            show_completed: false,
            show_deleted: false,
            show_due: true,
        }
    }
}

/// Remote calendar and task endpoints. Every call carries the bearer token
/// explicitly; implementations hold no auth state of their own.
#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn list_events(
        &self,
        token: &AccessToken,
        calendar_id: &str,
        query: &EventQuery,
    ) -> CalPlanResult<Vec<EventResource>>;

    async fn insert_event(
        &self,
        token: &AccessToken,
        calendar_id: &str,
        event: &EventResource,
    ) -> CalPlanResult<EventResource>;

    async fn update_event(
        &self,
        token: &AccessToken,
        calendar_id: &str,
        event_id: &str,
        event: &EventResource,
    ) -> CalPlanResult<EventResource>;

    /// Deleting an event that is already gone succeeds.
    async fn delete_event(
        &self,
        token: &AccessToken,
        calendar_id: &str,
        event_id: &str,
    ) -> CalPlanResult<()>;

    async fn get_event(
        &self,
        token: &AccessToken,
        calendar_id: &str,
        event_id: &str,
    ) -> CalPlanResult<EventResource>;

    async fn list_tasks(
        &self,
        token: &AccessToken,
        tasklist_id: &str,
        query: &TaskQuery,
    ) -> CalPlanResult<Vec<TaskResource>>;
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Obtain a fresh token (refresh or interactive consent).
    async fn request_access_token(&self) -> CalPlanResult<AccessToken>;

    /// A token saved by a previous session, if any.
    fn persisted_token(&self) -> Option<AccessToken>;

    /// Forget the persisted token.
    fn revoke(&self) -> CalPlanResult<()> {
        Ok(())
    }
}

/// Title used for remote events that carry no summary.
pub const UNTITLED: &str = "No Title";

/// Checkbox marker prepended to task titles.
pub const TASK_TITLE_PREFIX: &str = "[ ]: ";

/// The caller's IANA zone, or `UTC` when it cannot be determined.
pub fn local_time_zone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Shape the outbound payload for `event`.
///
/// All-day events send dates only. Timed events send an instant plus a zone,
/// falling back to the caller's local zone.
pub fn to_resource(event: &CalendarEvent) -> EventResource {
    let shape = |time: &EventTime| {
        if event.all_day {
            EventDateTime::all_day(time.date_naive())
        } else {
            let zone = time
                .time_zone()
                .map(str::to_string)
                .unwrap_or_else(local_time_zone);
            EventDateTime::timed(time.to_utc(), zone)
        }
    };

    EventResource {
        id: event.id.clone(),
        summary: Some(event.title.clone()),
        description: event.description.clone(),
        location: event.location.clone(),
        start: shape(&event.start),
        end: shape(&event.end),
        color_id: Some(palette_index_to_remote_color(event.color_index).color_id.to_string()),
        background: event.explicit_background,
    }
}

/// Ingest a remote event: decode its color and classify it.
pub fn from_resource(
    resource: EventResource,
    classifier: &Classifier,
    mode: BackgroundMode,
) -> CalPlanResult<CalendarEvent> {
    let id = resource.id.clone().unwrap_or_default();
    let (Some(start), Some(end)) = (resource.start.to_event_time(), resource.end.to_event_time())
    else {
        return Err(CalPlanError::Remote(format!(
            "event '{id}' has no start or end"
        )));
    };

    let title = resource
        .summary
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());
    let category = classifier.classify(&title, resource.background, Origin::EventList, mode);

    Ok(CalendarEvent {
        id: resource.id,
        all_day: resource.start.is_all_day(),
        color_index: remote_color_to_palette_index(resource.color_id.as_deref()),
        title,
        start,
        end,
        description: resource.description,
        location: resource.location,
        explicit_background: resource.background,
        category,
    })
}

/// Turn a task into an all-day pseudo-event on its due date.
///
/// Tasks without a due date are not shown. The exclusive end is the day
/// after the due date.
pub fn task_to_event(task: TaskResource) -> Option<CalendarEvent> {
    let due = task.due?.date_naive();
    let end = due.succ_opt()?;

    Some(CalendarEvent {
        id: Some(task.id),
        title: format!("{TASK_TITLE_PREFIX}{}", task.title),
        start: EventTime::date(due),
        end: EventTime::date(end),
        all_day: true,
        color_index: DEFAULT_COLOR_INDEX,
        description: task.description,
        location: None,
        explicit_background: false,
        category: Category::Task,
    })
}
