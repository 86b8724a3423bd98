use anyhow::Result;
use calplan_core::BackgroundMode;
use owo_colors::OwoColorize;

use super::EventArgs;
use crate::context::Context;
use crate::render::Render;
use crate::utils::tui::spin;

pub async fn run(
    id: String,
    title: Option<String>,
    args: EventArgs,
    mode: BackgroundMode,
) -> Result<()> {
    if title.is_none() && args.is_empty() {
        anyhow::bail!("Nothing to change. Pass --title, --start, --end, --duration or --color.");
    }

    let ctx = Context::connect().await?;

    let outcome = spin("Fetching event...", ctx.engine.fetch_event(&id, mode)).await;
    let Some(mut event) = super::applied(outcome?, "fetch") else {
        return Ok(());
    };

    if let Some(title) = title {
        event.title = title;
    }
    args.apply_to_event(&mut event)?;

    let outcome = spin("Updating event...", ctx.engine.update(&event, &id, mode)).await;

    if super::applied(outcome?, "update").is_some() {
        println!("{}", "  Updated:".green());
        println!("  {}", event.render());
    }

    Ok(())
}
