use anyhow::Result;
use calplan_core::BackgroundMode;
use owo_colors::OwoColorize;

use crate::context::Context;
use crate::render::Render;
use crate::utils::tui::spin;

pub async fn run(id: String, percent: f64, mode: BackgroundMode) -> Result<()> {
    let ctx = Context::connect().await?;

    let outcome = spin("Fetching event...", ctx.engine.fetch_event(&id, mode)).await;
    let Some(event) = super::applied(outcome?, "fetch") else {
        return Ok(());
    };

    let outcome = spin(
        format!("Splitting {} at {}%...", event.title, percent),
        ctx.engine.split(&event, &id, percent, mode),
    )
    .await;

    if let Some((first, second)) = super::applied(outcome?, "split") {
        println!("{}", "  Split into:".green());
        println!("  {}", first.render());
        println!("  {}", second.render());
    }

    Ok(())
}
