//! Event types shared by the sync engine, the template store and the CLI.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::Category;
use crate::error::{CalPlanError, CalPlanResult};
use crate::palette::{DEFAULT_COLOR_INDEX, TASK_COLOR_HEX, palette_index_to_remote_color};

/// Start or end of an event.
///
/// All-day events carry a calendar date, timed events carry an instant plus
/// the IANA zone it was entered in. The serialized form matches the remote
/// calendar's `{date}` / `{dateTime, timeZone}` objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    Date {
        date: NaiveDate,
    },
    DateTime {
        #[serde(rename = "dateTime")]
        date_time: DateTime<Utc>,
        #[serde(rename = "timeZone", default, skip_serializing_if = "Option::is_none")]
        time_zone: Option<String>,
    },
}

impl EventTime {
    pub fn date(date: NaiveDate) -> Self {
        EventTime::Date { date }
    }

    pub fn at(date_time: DateTime<Utc>) -> Self {
        EventTime::DateTime {
            date_time,
            time_zone: None,
        }
    }

    pub fn zoned(date_time: DateTime<Utc>, time_zone: impl Into<String>) -> Self {
        EventTime::DateTime {
            date_time,
            time_zone: Some(time_zone.into()),
        }
    }

    pub fn time_zone(&self) -> Option<&str> {
        match self {
            EventTime::Date { .. } => None,
            EventTime::DateTime { time_zone, .. } => time_zone.as_deref(),
        }
    }

    /// The instant this time denotes. Dates are taken at midnight UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            EventTime::Date { date } => date.and_time(NaiveTime::MIN).and_utc(),
            EventTime::DateTime { date_time, .. } => *date_time,
        }
    }

    /// Calendar date in the event's own zone (UTC when the zone is unknown).
    pub fn date_naive(&self) -> NaiveDate {
        match self {
            EventTime::Date { date } => *date,
            EventTime::DateTime {
                date_time,
                time_zone,
            } => match time_zone.as_deref().and_then(|tz| tz.parse::<chrono_tz::Tz>().ok()) {
                Some(tz) => date_time.with_timezone(&tz).date_naive(),
                None => date_time.date_naive(),
            },
        }
    }

    /// Same point in time, in the representation `all_day` asks for.
    pub fn normalized(&self, all_day: bool) -> EventTime {
        match (all_day, self) {
            (true, _) => EventTime::date(self.date_naive()),
            (false, EventTime::DateTime { .. }) => self.clone(),
            (false, EventTime::Date { date }) => {
                EventTime::at(date.and_time(NaiveTime::MIN).and_utc())
            }
        }
    }

    /// Move this time by `offset`, keeping its zone.
    pub fn shifted(&self, offset: Duration, all_day: bool) -> EventTime {
        let instant = self.to_utc() + offset;
        if all_day {
            return EventTime::date(instant.date_naive());
        }
        EventTime::DateTime {
            date_time: instant,
            time_zone: self.time_zone().map(str::to_string),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date { date } => write!(f, "{}", date.format("%Y-%m-%d")),
            EventTime::DateTime {
                date_time,
                time_zone,
            } => match time_zone.as_deref().and_then(|tz| tz.parse::<chrono_tz::Tz>().ok()) {
                Some(tz) => write!(f, "{}", date_time.with_timezone(&tz).to_rfc3339()),
                None => write!(f, "{}", date_time.to_rfc3339()),
            },
        }
    }
}

/// Fails with `InvalidRange` unless `end` is strictly after `start`.
pub fn validate_range(start: &EventTime, end: &EventTime) -> CalPlanResult<()> {
    if end.to_utc() <= start.to_utc() {
        return Err(CalPlanError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(())
}

/// How the rendering surface should draw an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Colored block behind interactive events
    Background,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderHints {
    pub display: DisplayMode,
    pub draggable: bool,
    pub color: &'static str,
}

/// A remote-identified calendar event as held in the local cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Remote id, absent until the event has been created remotely
    pub id: Option<String>,
    pub title: String,
    pub start: EventTime,
    pub end: EventTime,
    pub all_day: bool,
    pub color_index: i32,
    pub description: Option<String>,
    pub location: Option<String>,
    /// The remote service flagged this event for background display
    #[serde(default)]
    pub explicit_background: bool,
    /// Derived on ingestion, never sent to the remote service
    #[serde(skip, default = "Category::default")]
    pub category: Category,
}

impl CalendarEvent {
    pub fn new(title: impl Into<String>, start: EventTime, end: EventTime) -> Self {
        let all_day = matches!(start, EventTime::Date { .. });
        CalendarEvent {
            id: None,
            title: title.into(),
            start,
            end,
            all_day,
            color_index: DEFAULT_COLOR_INDEX,
            description: None,
            location: None,
            explicit_background: false,
            category: Category::Interactive,
        }
    }

    pub fn with_color(mut self, color_index: i32) -> Self {
        self.color_index = color_index;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks the endpoints in the shape they are sent in: all-day events
    /// are compared by date.
    pub fn validate_range(&self) -> CalPlanResult<()> {
        validate_range(
            &self.start.normalized(self.all_day),
            &self.end.normalized(self.all_day),
        )
    }

    pub fn color_hex(&self) -> &'static str {
        match self.category {
            Category::Task => TASK_COLOR_HEX,
            _ => palette_index_to_remote_color(self.color_index).hex,
        }
    }

    pub fn render_hints(&self) -> RenderHints {
        RenderHints {
            display: match self.category {
                Category::Background => DisplayMode::Background,
                _ => DisplayMode::Auto,
            },
            draggable: self.category == Category::Interactive,
            color: self.color_hex(),
        }
    }
}

impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
