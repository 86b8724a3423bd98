use anyhow::Result;
use calplan_core::{BackgroundMode, CalendarEvent};
use owo_colors::OwoColorize;

use super::EventArgs;
use crate::context::Context;
use crate::utils::parse::{parse_datetime, resolve_end};
use crate::utils::prompt::{prompt_duration, prompt_title, prompt_with_retry};
use crate::utils::tui::spin;

pub async fn run(title: Option<String>, args: EventArgs, mode: BackgroundMode) -> Result<()> {
    let interactive = title.is_none() || args.start.is_none();

    // --- Title ---
    let title = match title {
        Some(t) => t,
        None => prompt_title()?,
    };

    // --- Start ---
    let start_time = match args.start.as_deref() {
        Some(s) => parse_datetime(s)?,
        None => prompt_with_retry("  When?", parse_datetime)?,
    };

    // --- Duration / End ---
    let end_time = if args.end.is_none() && args.duration.is_none() && interactive {
        prompt_duration(&start_time)?
    } else {
        resolve_end(&start_time, args.end.as_deref(), args.duration.as_deref())?
    };

    let mut event = CalendarEvent::new(title, start_time, end_time);
    if let Some(color) = args.color {
        event = event.with_color(color);
    }
    event.description = args.description.filter(|d| !d.is_empty());
    event.location = args.location.filter(|l| !l.is_empty());

    let ctx = Context::connect().await?;

    let outcome = spin("Creating event...", ctx.engine.create(&event, mode)).await;

    let Some(created) = super::applied(outcome?, "create") else {
        return Ok(());
    };

    if interactive {
        println!();
    }
    println!("{}", format!("  Created: {}", created.title).green());
    if let Some(id) = &created.id {
        println!("  {}", id.dimmed());
    }

    Ok(())
}
