use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use crate::{
    Res,
    config::{self, ConfigError},
    spotify::{self, gateway::CredentialStore},
    types::Token,
};

/// Seconds before the nominal expiry at which a token counts as expired.
const EXPIRY_MARGIN_SECS: u64 = 240;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("cannot access token file {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("token file is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("token endpoint rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Persistent OAuth token with refresh support.
pub struct TokenManager {
    token: Token,
    path: PathBuf,
}

impl TokenManager {
    pub fn new(token: Token) -> Self {
        Self::with_path(token, Self::token_path())
    }

    pub fn with_path(token: Token, path: PathBuf) -> Self {
        TokenManager { token, path }
    }

    pub async fn load() -> Result<Self, TokenError> {
        Self::load_from(Self::token_path()).await
    }

    pub async fn load_from(path: PathBuf) -> Result<Self, TokenError> {
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| TokenError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let token: Token = serde_json::from_str(&content)?;
        Ok(Self { token, path })
    }

    /// Writes the token to disk.
    ///
    /// The write runs as its own task, so it completes even when the caller
    /// is cancelled halfway, e.g. by the per-artist timeout of the harvest
    /// while a refresh is in flight.
    pub async fn persist(&self) -> Result<(), TokenError> {
        let token = self.token.clone();
        let path = self.path.clone();

        tokio::spawn(async move { write_token(&path, &token).await })
            .await
            .map_err(|e| TokenError::Io {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        now + EXPIRY_MARGIN_SECS >= self.token.obtained_at + self.token.expires_in
    }

    fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp() as u64)
    }

    /// Refreshes the token up front when it is about to expire.
    pub async fn ensure_fresh(&mut self) -> Result<(), TokenError> {
        if self.is_expired() {
            self.refresh_now().await?;
        }
        Ok(())
    }

    /// Replaces the current token with `fresh`, keeping the previous refresh
    /// token when the endpoint did not rotate it.
    pub fn replace(&mut self, fresh: Token) {
        let refresh_token = if fresh.refresh_token.is_empty() {
            std::mem::take(&mut self.token.refresh_token)
        } else {
            fresh.refresh_token.clone()
        };

        self.token = Token {
            refresh_token,
            ..fresh
        };
    }

    async fn refresh_now(&mut self) -> Result<(), TokenError> {
        let fresh = spotify::auth::refresh_token(
            &config::spotify_apitoken_url(),
            &config::spotify_client_id()?,
            &self.token.refresh_token,
        )
        .await?;
        self.replace(fresh);
        self.persist().await
    }

    fn token_path() -> PathBuf {
        config::data_dir().join("cache/token.json")
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }
}

async fn write_token(path: &Path, token: &Token) -> Result<(), TokenError> {
    let io_err = |e: std::io::Error| TokenError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(token)?;
    async_fs::write(path, json).await.map_err(io_err)
}

impl CredentialStore for TokenManager {
    fn access_token(&self) -> String {
        self.token.access_token.clone()
    }

    async fn refresh(&mut self) -> Res<String> {
        self.refresh_now().await?;
        Ok(self.token.access_token.clone())
    }
}
