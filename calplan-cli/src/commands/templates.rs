//! The template drawer: reusable event shapes stored next to the data dir.

use anyhow::Result;
use calplan_core::{
    BackgroundMode, EventTemplate, EventTime, FileStore, NavigateDirection, TemplateStore,
};
use clap::{Subcommand, ValueEnum};
use owo_colors::OwoColorize;

use super::EventArgs;
use crate::context::Context;
use crate::render::{Render, print_templates};
use crate::utils::parse::{parse_datetime, resolve_end};
use crate::utils::prompt::{prompt_duration, prompt_with_retry};
use crate::utils::tui::spin;

#[derive(Subcommand)]
pub enum TemplatesCommand {
    /// Show the drawer in order
    List,
    /// Add a template from flags or from an existing event
    Add {
        title: Option<String>,

        /// Copy the shape of this remote event
        #[arg(long, conflicts_with_all = ["start", "end", "duration"])]
        from_event: Option<String>,

        #[command(flatten)]
        event: EventArgs,
    },
    Edit {
        index: usize,

        #[arg(short, long)]
        title: Option<String>,

        #[command(flatten)]
        event: EventArgs,
    },
    Delete {
        index: usize,
    },
    Swap {
        first: usize,
        second: usize,
    },
    /// Move a template one slot towards the front or back
    Move {
        index: usize,

        #[arg(value_enum)]
        direction: Direction,
    },
    /// Create an event from a template
    Stamp {
        index: usize,

        /// Start date/time of the new event
        #[arg(short, long)]
        at: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Direction {
    Prev,
    Next,
}

impl From<Direction> for NavigateDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Prev => NavigateDirection::Prev,
            Direction::Next => NavigateDirection::Next,
        }
    }
}

pub async fn run(command: TemplatesCommand, mode: BackgroundMode) -> Result<()> {
    let ctx = Context::load(false)?;
    let mut store = ctx.templates();

    match command {
        TemplatesCommand::List => {}
        TemplatesCommand::Add {
            title,
            from_event,
            event,
        } => {
            let template = match from_event {
                Some(id) => template_from_event(&id, title, &event, mode).await?,
                None => template_from_args(title, &event)?,
            };
            let title = template.title.clone();
            store.add(template)?;
            println!("{}", format!("  Added: {}", title).green());
        }
        TemplatesCommand::Edit {
            index,
            title,
            event,
        } => {
            let mut template = existing(&store, index)?;
            if let Some(title) = title {
                template.title = title;
            }
            event.apply_to_template(&mut template)?;
            store.edit(template, index)?;
        }
        TemplatesCommand::Delete { index } => {
            store.delete_clearing_selection(index)?;
        }
        TemplatesCommand::Swap { first, second } => {
            store.swap(first, second)?;
        }
        TemplatesCommand::Move { index, direction } => {
            store.select(index)?;
            store.select_navigate(direction.into())?;
        }
        TemplatesCommand::Stamp { index, at } => {
            let template = existing(&store, index)?;
            return stamp(&ctx, &template, &at, mode).await;
        }
    }

    print_templates(store.templates(), store.selected_index());
    Ok(())
}

fn existing(store: &TemplateStore<FileStore>, index: usize) -> Result<EventTemplate> {
    store.get(index).cloned().ok_or_else(|| {
        anyhow::anyhow!(
            "No template at index {} ({} templates)",
            index,
            store.len()
        )
    })
}

fn template_from_args(title: Option<String>, args: &EventArgs) -> Result<EventTemplate> {
    let title = match title {
        Some(t) => t,
        None => crate::utils::prompt::prompt_title()?,
    };

    let start = match args.start.as_deref() {
        Some(s) => parse_datetime(s)?,
        None => prompt_with_retry("  When? (sets the length only)", parse_datetime)?,
    };
    let end = if args.end.is_none() && args.duration.is_none() {
        prompt_duration(&start)?
    } else {
        resolve_end(&start, args.end.as_deref(), args.duration.as_deref())?
    };

    let mut template = EventTemplate::new(title, start, end);
    args.apply_to_template(&mut template)?;
    Ok(template)
}

async fn template_from_event(
    id: &str,
    title: Option<String>,
    args: &EventArgs,
    mode: BackgroundMode,
) -> Result<EventTemplate> {
    let ctx = Context::connect().await?;

    let outcome = spin("Fetching event...", ctx.engine.fetch_event(id, mode)).await;

    let Some(event) = super::applied(outcome?, "fetch") else {
        anyhow::bail!("Could not fetch event {}", id);
    };

    let mut template = EventTemplate::from_event(&event);
    if let Some(title) = title {
        template.title = title;
    }
    args.apply_to_template(&mut template)?;
    Ok(template)
}

async fn stamp(
    ctx: &Context,
    template: &EventTemplate,
    at: &str,
    mode: BackgroundMode,
) -> Result<()> {
    let start = parse_datetime(at)?;
    let event = match &start {
        EventTime::Date { .. } => template.stamp_at(start.to_utc(), None),
        EventTime::DateTime {
            date_time,
            time_zone,
        } => template.stamp_at(*date_time, time_zone.as_deref()),
    };

    ctx.require_credentials()?;
    ctx.engine.login().await?;

    let outcome = spin("Creating event...", ctx.engine.create(&event, mode)).await;

    if let Some(created) = super::applied(outcome?, "create") {
        println!("{}", "  Created:".green());
        println!("  {}", created.render());
    }

    Ok(())
}
