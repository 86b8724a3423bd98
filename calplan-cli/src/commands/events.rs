use anyhow::Result;
use calplan_core::{BackgroundMode, CalendarEvent, DateRange, WeekShift, shift_week, week_window};
use chrono::Local;
use clap::ValueEnum;
use owo_colors::OwoColorize;

use crate::context::Context;
use crate::render::print_events;
use crate::utils::parse::parse_date;
use crate::utils::tui::spin;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Week {
    Prev,
    Next,
    Today,
}

impl From<Week> for WeekShift {
    fn from(week: Week) -> Self {
        match week {
            Week::Prev => WeekShift::Prev,
            Week::Next => WeekShift::Next,
            Week::Today => WeekShift::Today,
        }
    }
}

pub async fn run(
    date: Option<String>,
    week: Option<Week>,
    mode: BackgroundMode,
    json: bool,
) -> Result<()> {
    let today = Local::now().date_naive();
    let anchor = match date {
        Some(input) => parse_date(&input)?,
        None => today,
    };
    let anchor = match week {
        Some(week) => shift_week(anchor, week.into(), today),
        None => anchor,
    };
    let window = week_window(anchor);

    let ctx = Context::connect().await?;

    let outcome = spin(
        "Loading events...",
        ctx.engine.load(window.start, window.end, mode),
    )
    .await;

    if super::applied(outcome?, "load").is_none() {
        return Ok(());
    }

    let events = in_window(ctx.engine.events().await, &window);

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    let monday = window.start.date_naive();
    println!("{}", format!("Week of {}", monday.format("%a %b %-d")).dimmed());
    println!();
    print_events(&events);
    Ok(())
}

/// The cache holds a padded window; keep what overlaps the displayed week.
pub fn in_window(events: Vec<CalendarEvent>, window: &DateRange) -> Vec<CalendarEvent> {
    events
        .into_iter()
        .filter(|e| e.start.to_utc() < window.end && e.end.to_utc() > window.start)
        .collect()
}
