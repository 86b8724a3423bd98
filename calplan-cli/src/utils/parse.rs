//! Natural-language dates, times and durations from the command line.

use anyhow::{Context, Result};
use calplan_core::EventTime;
use calplan_core::remote::local_time_zone;
use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Expand common abbreviations that fuzzydate doesn't handle.
fn expand_abbreviations(input: &str) -> String {
    let abbrevs = [
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thur", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("sept", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    let lower = input.to_lowercase();
    lower
        .split_whitespace()
        .map(|word| {
            abbrevs
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map(|(_, full)| *full)
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check if the user's input string contains time-related tokens.
fn has_time_component(input: &str) -> bool {
    let lower = input.to_lowercase();

    if lower.contains("noon") || lower.contains("midnight") {
        return true;
    }

    // am/pm right after a digit, e.g. "6pm", "6 pm"
    let bytes = lower.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if (b == b'a' || b == b'p') && i + 1 < bytes.len() && bytes[i + 1] == b'm' {
            if i > 0 && bytes[i - 1].is_ascii_digit() {
                return true;
            }
            if i > 1 && bytes[i - 1] == b' ' && bytes[i - 2].is_ascii_digit() {
                return true;
            }
        }
    }

    // HH:MM
    for (i, &b) in bytes.iter().enumerate() {
        if b == b':' {
            let has_digit_before = i > 0 && bytes[i - 1].is_ascii_digit();
            let has_digit_after = i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit();
            if has_digit_before && has_digit_after {
                return true;
            }
        }
    }

    // "at" followed by a digit, e.g. "at 3"
    let after_at = lower
        .find(" at ")
        .map(|pos| &lower[pos + 4..])
        .or_else(|| lower.strip_prefix("at "));
    after_at.is_some_and(|after| after.starts_with(|c: char| c.is_ascii_digit()))
}

/// Pin a wall-clock time to the local zone.
fn local_event_time(dt: NaiveDateTime) -> Result<EventTime> {
    let zone = local_time_zone();
    let tz: chrono_tz::Tz = zone.parse().unwrap_or(chrono_tz::UTC);
    let instant = tz
        .from_local_datetime(&dt)
        .earliest()
        .ok_or_else(|| anyhow::anyhow!("{dt} does not exist in {zone}"))?;
    Ok(EventTime::zoned(instant.with_timezone(&Utc), tz.name()))
}

/// Parse a natural language date/time string into an EventTime.
/// Inputs with a time of day become zoned instants, anything else an
/// all-day date.
pub fn parse_datetime(input: &str) -> Result<EventTime> {
    let expanded = expand_abbreviations(input);
    let dt = fuzzydate::parse(&expanded)
        .map_err(|_| anyhow::anyhow!("Could not parse date/time: \"{}\"", input))?;

    if has_time_component(input) {
        local_event_time(dt)
    } else {
        Ok(EventTime::date(dt.date()))
    }
}

/// Parse a day: `YYYY-MM-DD` or anything fuzzydate understands.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_datetime(input).map(|t| t.date_naive())
}

/// Parse an end input: a duration (humantime) or a date/time (fuzzydate).
pub fn parse_end(input: &str, start: &EventTime) -> Result<EventTime> {
    if let Ok(event_time) = try_apply_duration(start, input) {
        return Ok(event_time);
    }

    let cleaned = input
        .strip_prefix("until ")
        .or_else(|| input.strip_prefix("to "))
        .unwrap_or(input);

    parse_datetime(cleaned)
}

pub fn apply_duration(start: &EventTime, dur_input: &str) -> Result<EventTime> {
    try_apply_duration(start, dur_input)
        .with_context(|| format!("Could not parse duration: \"{}\"", dur_input))
}

fn try_apply_duration(start: &EventTime, dur_input: &str) -> Result<EventTime> {
    let std_dur = humantime::parse_duration(dur_input).map_err(|e| anyhow::anyhow!("{}", e))?;
    let chrono_dur = Duration::from_std(std_dur).context("Duration too large")?;
    let all_day = matches!(start, EventTime::Date { .. });

    Ok(start.shifted(chrono_dur, all_day))
}

/// Default end time: +1 hour for timed events, +1 day for all-day events.
pub fn default_end(start: &EventTime) -> EventTime {
    match start {
        EventTime::Date { .. } => start.shifted(Duration::days(1), true),
        EventTime::DateTime { .. } => start.shifted(Duration::hours(1), false),
    }
}

/// Resolve `--end` / `--duration` against `start`, falling back to the
/// default length.
pub fn resolve_end(
    start: &EventTime,
    end: Option<&str>,
    duration: Option<&str>,
) -> Result<EventTime> {
    match (end, duration) {
        (Some(end), _) => parse_end(end, start),
        (None, Some(duration)) => apply_duration(start, duration),
        (None, None) => Ok(default_end(start)),
    }
}
