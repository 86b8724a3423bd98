mod commands;
mod context;
mod render;
mod utils;

use anyhow::Result;
use calplan_core::{BackgroundMode, DEFAULT_SPLIT_PERCENT};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::EventArgs;
use commands::events::Week;
use commands::templates::TemplatesCommand;

#[derive(Parser)]
#[command(name = "calplan")]
#[command(about = "Plan your week against Google Calendar")]
struct Cli {
    /// Let background phases (Work, Study, ...) be edited like other events
    #[arg(long, global = true)]
    editable_background: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to Google and store the session
    Login,
    /// Forget the stored session
    Logout,
    /// Show the events of a week
    Events {
        /// Any day of the week to show (YYYY-MM-DD or e.g. "next friday")
        #[arg(long)]
        date: Option<String>,

        /// Step one week from --date (or today)
        #[arg(long, value_enum)]
        week: Option<Week>,

        /// Print the events as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create an event
    Add {
        title: Option<String>,

        #[command(flatten)]
        event: EventArgs,
    },
    /// Change an existing event
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[command(flatten)]
        event: EventArgs,
    },
    Delete {
        id: String,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Replace an event with two back-to-back events
    Split {
        id: String,

        /// Where the first part ends, as a percentage of the duration
        #[arg(short, long, default_value_t = DEFAULT_SPLIT_PERCENT)]
        percent: f64,
    },
    /// Manage event templates
    Templates {
        #[command(subcommand)]
        command: TemplatesCommand,
    },
    /// Reload the current week periodically
    Watch,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mode = if cli.editable_background {
        BackgroundMode::Editable
    } else {
        BackgroundMode::Locked
    };

    match cli.command {
        Commands::Login => commands::login::run().await,
        Commands::Logout => commands::logout::run().await,
        Commands::Events { date, week, json } => {
            commands::events::run(date, week, mode, json).await
        }
        Commands::Add { title, event } => commands::add::run(title, event, mode).await,
        Commands::Edit { id, title, event } => commands::edit::run(id, title, event, mode).await,
        Commands::Delete { id, yes } => commands::delete::run(id, yes).await,
        Commands::Split { id, percent } => commands::split::run(id, percent, mode).await,
        Commands::Templates { command } => commands::templates::run(command, mode).await,
        Commands::Watch => commands::watch::run(mode).await,
    }
}
