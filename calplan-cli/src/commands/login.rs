use anyhow::Result;
use calplan_provider_google::default_session_path;
use owo_colors::OwoColorize;

use crate::context::Context;

pub async fn run() -> Result<()> {
    let ctx = Context::load(true)?;
    ctx.require_credentials()?;

    println!("Signing in to Google...");
    ctx.engine.login().await?;

    println!("{}", "Signed in".green());
    println!(
        "{}",
        format!("Session stored at {}", default_session_path()?.display()).dimmed()
    );
    Ok(())
}
