pub mod add;
pub mod delete;
pub mod edit;
pub mod events;
pub mod login;
pub mod logout;
pub mod split;
pub mod templates;
pub mod watch;

use anyhow::Result;
use calplan_core::{CalendarEvent, EventTemplate, EventTime, SyncOutcome};
use clap::Args;
use owo_colors::OwoColorize;

use crate::utils::parse::{parse_datetime, resolve_end};

/// Event fields shared by `add`, `edit` and `templates add/edit`.
#[derive(Args, Debug, Default)]
pub struct EventArgs {
    /// Start date/time (e.g. "tomorrow 3pm", "fri", "2026-03-20 15:00")
    #[arg(short, long)]
    pub start: Option<String>,

    /// End date/time, or a duration like "45m"
    #[arg(short, long, conflicts_with = "duration")]
    pub end: Option<String>,

    /// Duration (e.g. "30m", "2h", "3days")
    #[arg(short, long)]
    pub duration: Option<String>,

    /// Palette color index (0-12)
    #[arg(short, long)]
    pub color: Option<i32>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(short, long)]
    pub location: Option<String>,
}

impl EventArgs {
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.duration.is_none()
            && self.color.is_none()
            && self.description.is_none()
            && self.location.is_none()
    }

    /// New start and end for an existing `start..end`. A new start keeps the
    /// old length unless an end or duration is given too.
    pub fn retime(&self, start: &EventTime, end: &EventTime) -> Result<(EventTime, EventTime)> {
        let new_start = match self.start.as_deref() {
            Some(input) => parse_datetime(input)?,
            None => start.clone(),
        };

        let new_end = if self.end.is_some() || self.duration.is_some() {
            resolve_end(&new_start, self.end.as_deref(), self.duration.as_deref())?
        } else if self.start.is_some() {
            let all_day = matches!(new_start, EventTime::Date { .. });
            new_start.shifted(end.to_utc() - start.to_utc(), all_day)
        } else {
            end.clone()
        };

        Ok((new_start, new_end))
    }

    pub fn apply_to_event(&self, event: &mut CalendarEvent) -> Result<()> {
        let (start, end) = self.retime(&event.start, &event.end)?;
        event.all_day = matches!(start, EventTime::Date { .. });
        event.start = start;
        event.end = end;
        if let Some(color) = self.color {
            event.color_index = color;
        }
        if let Some(description) = &self.description {
            event.description = non_empty(description);
        }
        if let Some(location) = &self.location {
            event.location = non_empty(location);
        }
        Ok(())
    }

    pub fn apply_to_template(&self, template: &mut EventTemplate) -> Result<()> {
        let (start, end) = self.retime(&template.start, &template.end)?;
        template.all_day = matches!(start, EventTime::Date { .. });
        template.start = start;
        template.end = end;
        if let Some(color) = self.color {
            template.color_index = color;
        }
        if let Some(description) = &self.description {
            template.description = non_empty(description);
        }
        if let Some(location) = &self.location {
            template.location = non_empty(location);
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() { None } else { Some(value.to_string()) }
}

/// Unwrap an engine outcome, telling the user when the call was dropped.
pub fn applied<T>(outcome: SyncOutcome<T>, what: &str) -> Option<T> {
    match outcome {
        SyncOutcome::Applied(value) => Some(value),
        SyncOutcome::Skipped => {
            eprintln!(
                "{}",
                format!("Skipped {}: not signed in or another sync is running", what).yellow()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn at(h: u32) -> EventTime {
        EventTime::zoned(Utc.with_ymd_and_hms(2026, 3, 20, h, 0, 0).unwrap(), "UTC")
    }

    #[test]
    fn retime_without_times_keeps_both() {
        let args = EventArgs::default();
        assert!(args.is_empty());
        assert_eq!(args.retime(&at(9), &at(11)).unwrap(), (at(9), at(11)));
    }

    #[test]
    fn retime_duration_moves_only_the_end() {
        let args = EventArgs {
            duration: Some("3h".into()),
            ..Default::default()
        };
        assert_eq!(args.retime(&at(9), &at(11)).unwrap(), (at(9), at(12)));
    }

    #[test]
    fn apply_sets_fields_and_clears_empty_text() {
        let mut event = CalendarEvent::new("Review", at(9), at(10)).with_description("old");
        let args = EventArgs {
            color: Some(4),
            description: Some(String::new()),
            location: Some("Room 2".into()),
            ..Default::default()
        };
        args.apply_to_event(&mut event).unwrap();
        assert_eq!(event.color_index, 4);
        assert_eq!(event.description, None);
        assert_eq!(event.location.as_deref(), Some("Room 2"));
        assert!(!event.all_day);
    }

    #[test]
    fn apply_to_template_keeps_all_day_shape() {
        let day = |d| EventTime::date(NaiveDate::from_ymd_opt(2026, 3, d).unwrap());
        let mut template = EventTemplate::new("Trip", day(20), day(22));
        EventArgs::default().apply_to_template(&mut template).unwrap();
        assert!(template.all_day);
        assert_eq!(template.duration_minutes(), 2 * 24 * 60);
    }
}
