//! Mapping between calplan's remote resources and google-calendar types.

use calplan_core::{EventDateTime, EventResource};

pub trait ToGoogle {
    fn to_google(&self) -> google_calendar::types::Event;
}

pub trait FromGoogle {
    fn from_google(event: google_calendar::types::Event) -> Self;
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn event_time_to_google(time: &EventDateTime) -> google_calendar::types::EventDateTime {
    google_calendar::types::EventDateTime {
        date: time.date,
        date_time: time.date_time,
        time_zone: time.time_zone.clone().unwrap_or_default(),
    }
}

fn event_time_from_google(time: Option<google_calendar::types::EventDateTime>) -> EventDateTime {
    match time {
        Some(time) => EventDateTime {
            date: time.date,
            date_time: time.date_time,
            time_zone: non_empty(time.time_zone),
        },
        None => EventDateTime::default(),
    }
}

impl ToGoogle for EventResource {
    fn to_google(&self) -> google_calendar::types::Event {
        google_calendar::types::Event {
            // Let Google assign ids; it rejects client-chosen ones
            id: String::new(),
            summary: self.summary.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            location: self.location.clone().unwrap_or_default(),
            start: Some(event_time_to_google(&self.start)),
            end: Some(event_time_to_google(&self.end)),
            color_id: self.color_id.clone().unwrap_or_default(),
            transparency: if self.background {
                "transparent".to_string()
            } else {
                "opaque".to_string()
            },
            ..Default::default()
        }
    }
}

impl FromGoogle for EventResource {
    fn from_google(event: google_calendar::types::Event) -> Self {
        EventResource {
            id: non_empty(event.id),
            summary: non_empty(event.summary),
            description: non_empty(event.description),
            location: non_empty(event.location),
            start: event_time_from_google(event.start),
            end: event_time_from_google(event.end),
            color_id: non_empty(event.color_id),
            background: event.transparency == "transparent",
        }
    }
}
