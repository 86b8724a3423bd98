use anyhow::Result;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::context::Context;
use crate::utils::tui::spin;

pub async fn run(id: String, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete event {}?", id))
            .default(false)
            .interact()?;
        if !confirmed {
            return Ok(());
        }
    }

    let ctx = Context::connect().await?;

    let outcome = spin("Deleting event...", ctx.engine.delete(&id)).await;

    if super::applied(outcome?, "delete").is_some() {
        println!("{}", format!("  Deleted: {}", id).green());
    }

    Ok(())
}
