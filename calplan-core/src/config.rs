//! Configuration at ~/.config/calplan/config.toml, layered with `CALPLAN_*`
//! environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::classify::{Classifier, DEFAULT_BACKGROUND_PHASES};
use crate::error::{CalPlanError, CalPlanResult};

static DEFAULT_DATA_DIR: &str = "~/.local/share/calplan";

pub const CALENDAR_DISCOVERY_DOC: &str =
    "https://www.googleapis.com/discovery/v1/apis/calendar/v3/rest";
pub const TASKS_DISCOVERY_DOC: &str = "https://www.googleapis.com/discovery/v1/apis/tasks/v1/rest";

pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
pub const TASKS_SCOPE: &str = "https://www.googleapis.com/auth/tasks";

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_tasklist_id() -> String {
    "@default".to_string()
}

fn default_background_phases() -> Vec<String> {
    DEFAULT_BACKGROUND_PHASES.iter().map(|p| p.to_string()).collect()
}

fn default_poll_interval_secs() -> u64 {
    20
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_scope() -> Vec<String> {
    vec![CALENDAR_SCOPE.to_string(), TASKS_SCOPE.to_string()]
}

fn default_discovery_documents() -> Vec<String> {
    vec![
        CALENDAR_DISCOVERY_DOC.to_string(),
        TASKS_DISCOVERY_DOC.to_string(),
    ]
}

/// Remote service credentials and API surfaces.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    pub api_key: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: Vec<String>,
    #[serde(default = "default_discovery_documents")]
    pub discovery_documents: Vec<String>,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        GoogleConfig {
            client_id: String::new(),
            client_secret: String::new(),
            api_key: None,
            scope: default_scope(),
            discovery_documents: default_discovery_documents(),
        }
    }
}

impl GoogleConfig {
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalPlanConfig {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    #[serde(default = "default_tasklist_id")]
    pub tasklist_id: String,

    /// Title prefixes shown as background phases
    #[serde(default = "default_background_phases")]
    pub background_phases: Vec<String>,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub google: GoogleConfig,
}

impl CalPlanConfig {
    pub fn config_path() -> CalPlanResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalPlanError::Config("Could not determine config directory".into()))?
            .join("calplan");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default path, creating a commented default file first
    /// if none exists.
    pub fn load() -> CalPlanResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> CalPlanResult<Self> {
        Self::load_layered(path, Self::environment())
    }

    /// `CALPLAN_CALENDAR_ID`, `CALPLAN_GOOGLE__CLIENT_ID`, and
    /// `CALPLAN_BACKGROUND_PHASES` as a comma-separated list.
    fn environment() -> Environment {
        Environment::with_prefix("CALPLAN")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("background_phases")
            .with_list_parse_key("google.scope")
            .with_list_parse_key("google.discovery_documents")
            .try_parsing(true)
    }

    fn load_layered(path: &Path, environment: Environment) -> CalPlanResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(environment)
            .build()
            .map_err(|e| CalPlanError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalPlanError::Config(e.to_string()))
    }

    /// Data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.background_phases.iter().cloned())
    }

    /// Tasks are listed only when the Tasks API is among the discovery
    /// documents.
    pub fn tasks_enabled(&self) -> bool {
        self.google
            .discovery_documents
            .iter()
            .any(|doc| doc.contains("/tasks/"))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalPlanResult<()> {
        let contents = format!(
            "\
# calplan configuration

# Calendar and task list to sync:
# calendar_id = \"primary\"
# tasklist_id = \"@default\"

# Events whose titles start with these are drawn as background phases:
# background_phases = [\"Work\", \"Study\", \"Free\", \"Vacation\"]

# Seconds between background reloads in `calplan watch`:
# poll_interval_secs = 20

# Where templates are stored:
# data_dir = \"{DEFAULT_DATA_DIR}\"

# OAuth client from the Google Cloud console:
# [google]
# client_id = \"\"
# client_secret = \"\"
# api_key = \"\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalPlanError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalPlanError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commented_default_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calplan").join("config.toml");
        CalPlanConfig::create_default_config(&path).unwrap();

        let config = CalPlanConfig::load_from(&path).unwrap();
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.tasklist_id, "@default");
        assert_eq!(config.background_phases, default_background_phases());
        assert_eq!(config.poll_interval(), Duration::from_secs(20));
        assert!(config.tasks_enabled());
        assert!(!config.google.has_credentials());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
calendar_id = "team@example.com"
background_phases = ["Arbeitszeit", "Unizeit"]

[google]
client_id = "id"
client_secret = "secret"
discovery_documents = ["https://www.googleapis.com/discovery/v1/apis/calendar/v3/rest"]
"#,
        )
        .unwrap();

        let config = CalPlanConfig::load_from(&path).unwrap();
        assert_eq!(config.calendar_id, "team@example.com");
        assert!(config.classifier().is_phase_title("Unizeit"));
        assert!(!config.classifier().is_phase_title("Work"));
        assert!(config.google.has_credentials());
        assert!(!config.tasks_enabled());
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "calendar_id = \"from-file\"\n").unwrap();

        let vars = config::Map::from([
            ("CALPLAN_CALENDAR_ID".to_string(), "team@example.com".to_string()),
            ("CALPLAN_POLL_INTERVAL_SECS".to_string(), "45".to_string()),
            ("CALPLAN_BACKGROUND_PHASES".to_string(), "Focus,Gym".to_string()),
            ("CALPLAN_GOOGLE__CLIENT_ID".to_string(), "env-id".to_string()),
        ]);
        let environment = CalPlanConfig::environment().source(Some(vars));

        let config = CalPlanConfig::load_layered(&path, environment).unwrap();
        assert_eq!(config.calendar_id, "team@example.com");
        assert_eq!(config.poll_interval(), Duration::from_secs(45));
        assert_eq!(config.background_phases, vec!["Focus", "Gym"]);
        assert_eq!(config.google.client_id, "env-id");
    }

    #[test]
    fn data_path_expands_tilde() {
        let dir = tempfile::tempdir().unwrap();
        let config = CalPlanConfig::load_from(&dir.path().join("missing.toml")).unwrap();
        assert!(!config.data_path().to_string_lossy().starts_with('~'));
    }
}
