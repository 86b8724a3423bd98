//! Persisted Google OAuth tokens.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calplan_core::AccessToken;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("calplan"))
}

pub fn default_session_path() -> Result<PathBuf> {
    Ok(base_dir()?.join("session.toml"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&google_calendar::AccessToken> for SessionData {
    fn from(tokens: &google_calendar::AccessToken) -> Self {
        SessionData::from_tokens(
            tokens.access_token.clone(),
            tokens.refresh_token.clone(),
            tokens.expires_in,
        )
    }
}

impl From<&SessionData> for AccessToken {
    fn from(data: &SessionData) -> Self {
        AccessToken {
            access_token: data.access_token.clone(),
            refresh_token: data.refresh_token.clone(),
            expires_at: Some(data.expires_at),
        }
    }
}

impl SessionData {
    pub fn from_tokens(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        SessionData {
            access_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Token file on disk. Holds secrets, so it is written owner-only.
#[derive(Debug, Clone)]
pub struct Session {
    path: PathBuf,
}

impl Session {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Session { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<SessionData> {
        let contents = std::fs::read_to_string(&self.path).with_context(|| {
            format!(
                "Failed to read Google OAuth session from {}",
                self.path.display()
            )
        })?;

        toml::from_str(&contents).with_context(|| {
            format!(
                "Failed to parse Google OAuth session from {}",
                self.path.display()
            )
        })
    }

    pub fn save(&self, data: &SessionData) -> Result<()> {
        let contents = toml::to_string_pretty(data).context("Failed to serialize session")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write session to {}", self.path.display()))?;

        // Owner-only (0600), the file contains OAuth tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        Ok(())
    }

    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::at(dir.path().join("calplan").join("session.toml"));
        let data = SessionData::from_tokens("access".into(), "refresh".into(), 3600);

        session.save(&data).unwrap();
        assert_eq!(session.load().unwrap(), data);
        assert!(!data.is_expired());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(session.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        session.remove().unwrap();
        assert!(!session.exists());
        session.remove().unwrap();
    }

    #[test]
    fn converts_to_core_token() {
        let data = SessionData::from_tokens("a".into(), "r".into(), -10);
        let token = AccessToken::from(&data);
        assert_eq!(token.access_token, "a");
        assert_eq!(token.refresh_token, "r");
        assert!(token.is_expired());
    }
}
