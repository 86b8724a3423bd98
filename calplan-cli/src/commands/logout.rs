use anyhow::Result;
use owo_colors::OwoColorize;

use crate::context::Context;

pub async fn run() -> Result<()> {
    let ctx = Context::load(false)?;
    ctx.engine.logout().await?;
    println!("{}", "Signed out".green());
    Ok(())
}
