//! Wiring shared by every command: config, Google backend, sync engine and
//! the template store.

use anyhow::{Context as _, Result};
use calplan_core::{CalPlanConfig, FileStore, SyncEngine, TemplateStore};
use calplan_provider_google::{GoogleAuth, GoogleCalendar, Session, default_session_path};
use tracing::debug;

pub type Engine = SyncEngine<GoogleCalendar, GoogleAuth>;

pub struct Context {
    pub config: CalPlanConfig,
    pub engine: Engine,
}

impl Context {
    /// Build the engine without talking to Google. Only `calplan login`
    /// passes `interactive` and may open a browser.
    pub fn load(interactive: bool) -> Result<Self> {
        let config = CalPlanConfig::load().context("Failed to load config")?;

        let session = Session::at(default_session_path()?);
        let mut auth = GoogleAuth::new(&config.google, session);
        if !interactive {
            auth = auth.non_interactive();
        }

        let mut engine = SyncEngine::new(
            GoogleCalendar::new(&config.google),
            auth,
            config.calendar_id.clone(),
        )
        .with_classifier(config.classifier());

        if config.tasks_enabled() {
            engine = engine.with_tasklist(config.tasklist_id.clone());
        }

        debug!(calendar = %config.calendar_id, tasks = config.tasks_enabled(), "engine ready");

        Ok(Context { config, engine })
    }

    /// Load and sign in with the stored session.
    pub async fn connect() -> Result<Self> {
        let ctx = Self::load(false)?;
        ctx.require_credentials()?;
        ctx.engine.login().await?;
        Ok(ctx)
    }

    pub fn require_credentials(&self) -> Result<()> {
        if self.config.google.has_credentials() {
            return Ok(());
        }

        let path = CalPlanConfig::config_path()?;
        anyhow::bail!(
            "No Google OAuth client configured.\n\n\
            Add client_id and client_secret under [google] in:\n  {}",
            path.display()
        );
    }

    pub fn templates(&self) -> TemplateStore<FileStore> {
        TemplateStore::load(FileStore::new(self.config.data_path()))
    }
}
