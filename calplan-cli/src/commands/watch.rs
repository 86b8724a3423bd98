//! Periodic reload of the current week until Ctrl-C.

use anyhow::Result;
use calplan_core::{BackgroundMode, SyncOutcome, week_window};
use chrono::Local;
use owo_colors::OwoColorize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::events::in_window;
use crate::context::Context;
use crate::render::print_events;

pub async fn run(mode: BackgroundMode) -> Result<()> {
    let ctx = Context::load(false)?;
    ctx.require_credentials()?;
    ctx.engine.login().await?;

    let interval = ctx.config.poll_interval();
    println!(
        "{}",
        format!("Reloading every {}s, Ctrl-C to stop", interval.as_secs()).dimmed()
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => reload(&ctx, mode).await,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    Ok(())
}

async fn reload(ctx: &Context, mode: BackgroundMode) {
    if !ctx.engine.session().is_authenticated {
        if let Err(e) = ctx.engine.login().await {
            warn!(error = %e, "sign-in failed, skipping reload");
            return;
        }
    }

    let window = week_window(Local::now().date_naive());
    match ctx.engine.load(window.start, window.end, mode).await {
        Ok(SyncOutcome::Applied(count)) => {
            debug!(count, "reloaded");
            let events = in_window(ctx.engine.events().await, &window);
            println!();
            println!(
                "{}",
                format!("Updated {}", Local::now().format("%H:%M:%S")).dimmed()
            );
            print_events(&events);
        }
        Ok(SyncOutcome::Skipped) => debug!("reload skipped"),
        Err(e) => eprintln!("{}", format!("Reload failed: {}", e).red()),
    }
}
