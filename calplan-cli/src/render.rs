//! Terminal rendering for events and templates.
//!
//! Extension traits add colored output to calplan-core types using
//! owo_colors.

use calplan_core::{CalendarEvent, DisplayMode, EventTemplate, EventTime};
use calplan_core::palette::palette_index_to_remote_color;
use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

/// `#rrggbb` or `#rrggbbaa` to an RGB triple. Alpha is ignored.
fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 && digits.len() != 8 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// A colored dot for the event's palette color.
fn swatch(hex: &str, glyph: &str) -> String {
    match parse_hex(hex) {
        Some((r, g, b)) => glyph.truecolor(r, g, b).to_string(),
        None => glyph.to_string(),
    }
}

impl Render for CalendarEvent {
    fn render(&self) -> String {
        let hints = self.render_hints();
        let glyph = match (hints.display, hints.draggable) {
            (DisplayMode::Background, _) => "▒",
            (_, false) => "☐",
            _ => "●",
        };

        let time = format_time(&self.start, self.all_day);
        let title = match hints.display {
            DisplayMode::Background => self.title.dimmed().to_string(),
            DisplayMode::Auto => self.title.clone(),
        };
        let id = self
            .id
            .as_deref()
            .map(|id| format!("[{}]", id).dimmed().to_string())
            .unwrap_or_default();

        format!("{} {} {} {}", time, swatch(hints.color, glyph), title, id)
    }
}

impl Render for EventTemplate {
    fn render(&self) -> String {
        let color = palette_index_to_remote_color(self.color_index);
        let length = if self.all_day {
            format!("{}d", self.duration_minutes() / (24 * 60))
        } else {
            format_minutes(self.duration_minutes())
        };
        format!("{} {} {}", swatch(color.hex, "●"), self.title, length.dimmed())
    }
}

/// Print events grouped by local day, in start order.
pub fn print_events(events: &[CalendarEvent]) {
    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return;
    }

    let mut sorted: Vec<&CalendarEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.start.to_utc());

    let today = Local::now().date_naive();
    let mut current_date: Option<NaiveDate> = None;

    for event in sorted {
        let date = local_date(&event.start);
        if current_date != Some(date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", format_date_label(date, today).bold());
            current_date = Some(date);
        }
        println!("  {}", event.render());
    }
}

pub fn print_templates(templates: &[EventTemplate], selected: Option<usize>) {
    if templates.is_empty() {
        println!("{}", "No templates yet".dimmed());
        return;
    }

    for (index, template) in templates.iter().enumerate() {
        let marker = if selected == Some(index) { ">" } else { " " };
        println!("{} {:>2} {}", marker, index, template.render());
    }
}

fn local_date(time: &EventTime) -> NaiveDate {
    match time {
        EventTime::Date { date } => *date,
        EventTime::DateTime { date_time, .. } => date_time.with_timezone(&Local).date_naive(),
    }
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
fn format_date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// Format the time portion of an event (e.g. "15:00" or "all-day")
fn format_time(time: &EventTime, all_day: bool) -> String {
    match time {
        EventTime::DateTime { date_time, .. } if !all_day => {
            format!("{:>7}", date_time.with_timezone(&Local).format("%H:%M"))
        }
        _ => "all-day".to_string(),
    }
}

fn format_minutes(minutes: i64) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h{}m", h, m),
    }
}
