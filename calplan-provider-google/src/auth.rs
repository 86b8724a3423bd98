//! Auth provider backed by Google OAuth.
//!
//! A new token comes from refreshing the persisted session when it carries
//! a refresh token, otherwise from the interactive consent flow (unless the
//! provider was built non-interactive).

use anyhow::{Context, Result};
use async_trait::async_trait;
use calplan_core::{AccessToken, AuthProvider, CalPlanError, CalPlanResult, GoogleConfig};
use google_calendar::Client;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::oauth;
use crate::session::{Session, SessionData};

pub struct GoogleAuth {
    client_id: String,
    client_secret: String,
    scopes: Vec<String>,
    session: Session,
    interactive: bool,
    /// Held while refreshing or asking for consent
    refresh_lock: Mutex<()>,
}

impl GoogleAuth {
    pub fn new(config: &GoogleConfig, session: Session) -> Self {
        GoogleAuth {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scopes: config.scope.clone(),
            session,
            interactive: true,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Never open a browser; fail instead when no refresh token is stored.
    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn refresh(&self, data: &SessionData) -> Result<SessionData> {
        let client = Client::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            String::new(),
            data.access_token.clone(),
            data.refresh_token.clone(),
        );

        let mut tokens = client
            .refresh_access_token()
            .await
            .context("Failed to refresh token")?;

        // Google typically doesn't return a new refresh_token on refresh
        if tokens.refresh_token.is_empty() {
            tokens.refresh_token = data.refresh_token.clone();
        }

        Ok(SessionData::from(&tokens))
    }

    async fn obtain(&self) -> Result<SessionData> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            anyhow::bail!(
                "Google credentials not configured.\n\n\
                Add them to the [google] table of your calplan config:\n\n\
                client_id = \"your-client-id.apps.googleusercontent.com\"\n\
                client_secret = \"your-client-secret\"\n\n\
                See https://console.cloud.google.com/apis/credentials for setup."
            );
        }

        let _guard = self.refresh_lock.lock().await;

        let stored = if self.session.exists() {
            match self.session.load() {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "ignoring unreadable session");
                    None
                }
            }
        } else {
            None
        };

        if let Some(data) = stored.filter(|d| !d.refresh_token.is_empty()) {
            debug!(path = %self.session.path().display(), "refreshing access token");
            match self.refresh(&data).await {
                Ok(fresh) => {
                    self.session.save(&fresh)?;
                    return Ok(fresh);
                }
                Err(e) if self.interactive => {
                    warn!(error = %format!("{e:#}"), "refresh failed, asking for consent");
                }
                Err(e) => return Err(e),
            }
        }

        if !self.interactive {
            anyhow::bail!("No stored Google session; run `calplan login` first");
        }

        let fresh = oauth::consent(&self.client_id, &self.client_secret, &self.scopes).await?;
        self.session.save(&fresh)?;
        info!(path = %self.session.path().display(), "session saved");
        Ok(fresh)
    }
}

#[async_trait]
impl AuthProvider for GoogleAuth {
    async fn request_access_token(&self) -> CalPlanResult<AccessToken> {
        self.obtain()
            .await
            .map(|data| AccessToken::from(&data))
            .map_err(|e| CalPlanError::AuthFailed(format!("{e:#}")))
    }

    fn persisted_token(&self) -> Option<AccessToken> {
        if !self.session.exists() {
            return None;
        }
        match self.session.load() {
            Ok(data) => Some(AccessToken::from(&data)),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "could not read persisted session");
                None
            }
        }
    }

    fn revoke(&self) -> CalPlanResult<()> {
        self.session
            .remove()
            .map_err(|e| CalPlanError::Storage(format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GoogleConfig {
        GoogleConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            ..Default::default()
        }
    }

    #[test]
    fn persisted_token_reads_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::at(dir.path().join("session.toml"));
        let auth = GoogleAuth::new(&config(), session.clone());
        assert!(auth.persisted_token().is_none());

        session
            .save(&SessionData::from_tokens("a".into(), "r".into(), 3600))
            .unwrap();
        let token = auth.persisted_token().unwrap();
        assert_eq!(token.access_token, "a");
        assert!(!token.is_expired());

        auth.revoke().unwrap();
        assert!(auth.persisted_token().is_none());
    }

    #[tokio::test]
    async fn non_interactive_without_session_fails() {
        let dir = tempfile::tempdir().unwrap();
        let auth = GoogleAuth::new(&config(), Session::at(dir.path().join("session.toml")))
            .non_interactive();

        let err = auth.request_access_token().await.unwrap_err();
        assert!(matches!(err, CalPlanError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_network() {
        let dir = tempfile::tempdir().unwrap();
        let auth = GoogleAuth::new(
            &GoogleConfig::default(),
            Session::at(dir.path().join("session.toml")),
        );

        match auth.request_access_token().await {
            Err(CalPlanError::AuthFailed(msg)) => assert!(msg.contains("credentials")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
