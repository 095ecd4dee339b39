//! Configuration management for the monthly release playlist job.
//!
//! Values come from environment variables, optionally pre-populated from a
//! `.env` file in the local data directory:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)
//!
//! Getters for required values return [`ConfigError::Missing`] instead of
//! panicking so the CLI can report the problem and exit cleanly.

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;

use crate::spotify::gateway::RetryPolicy;

/// Directory name below the platform data directory.
pub const APP_DIR: &str = "monthpicks";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("cannot load environment file {path}: {reason}")]
    EnvFile { path: String, reason: String },
}

/// Returns the application's local data directory.
///
/// - Linux: `~/.local/share/monthpicks`
/// - macOS: `~/Library/Application Support/monthpicks`
/// - Windows: `%LOCALAPPDATA%/monthpicks`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Loads environment variables from `<data_dir>/.env`.
///
/// Creates the data directory when it does not exist yet. Variables already
/// present in the process environment are not overridden.
pub async fn load_env() -> Result<(), ConfigError> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| ConfigError::EnvFile {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
    }

    dotenv::from_path(&path).map_err(|e| ConfigError::EnvFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn or_default(key: &'static str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parsed<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        _ => Ok(None),
    }
}

/// Address the local OAuth callback server binds to, e.g. `127.0.0.1:8888`.
pub fn server_addr() -> String {
    or_default("SERVER_ADDRESS", "127.0.0.1:8888")
}

/// Client id of the registered Spotify application.
pub fn spotify_client_id() -> Result<String, ConfigError> {
    required("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// Redirect URI registered with the Spotify application. Must point at
/// [`server_addr`]'s `/callback` route.
pub fn spotify_redirect_uri() -> Result<String, ConfigError> {
    required("SPOTIFY_API_REDIRECT_URI")
}

/// Scopes requested during authorization. Playlist reads are needed for the
/// lookup by name, modifications for creation and appends.
pub fn spotify_scope() -> String {
    or_default(
        "SPOTIFY_API_AUTH_SCOPE",
        "playlist-modify-public playlist-modify-private playlist-read-private",
    )
}

pub fn spotify_apiauth_url() -> String {
    or_default("SPOTIFY_API_AUTH_URL", "https://accounts.spotify.com/authorize")
}

pub fn spotify_apiurl() -> String {
    or_default("SPOTIFY_API_URL", "https://api.spotify.com/v1")
}

pub fn spotify_apitoken_url() -> String {
    or_default(
        "SPOTIFY_API_TOKEN_URL",
        "https://accounts.spotify.com/api/token",
    )
}

pub fn notion_api_url() -> String {
    or_default("NOTION_API_URL", "https://api.notion.com/v1")
}

pub fn notion_token() -> Result<String, ConfigError> {
    required("NOTION_API_TOKEN")
}

pub fn notion_database_id() -> Result<String, ConfigError> {
    required("NOTION_DATABASE_ID")
}

/// Name of the database column holding the artist's Spotify URI.
pub fn notion_artist_property() -> String {
    or_default("NOTION_ARTIST_PROPERTY", "Spotify URI")
}

/// Whether a newly created playlist is public. Defaults to `true`.
pub fn playlist_public() -> Result<bool, ConfigError> {
    Ok(parsed::<bool>("MONTHPICKS_PLAYLIST_PUBLIC")?.unwrap_or(true))
}

/// Optional wall-clock cap for harvesting a single artist.
pub fn artist_timeout() -> Result<Option<Duration>, ConfigError> {
    Ok(parsed::<u64>("MONTHPICKS_ARTIST_TIMEOUT_SECS")?
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs))
}

/// Builds the gateway's retry policy, starting from [`RetryPolicy::default`]
/// and applying any overrides found in the environment.
pub fn retry_policy() -> Result<RetryPolicy, ConfigError> {
    let mut policy = RetryPolicy::default();

    if let Some(ms) = parsed::<u64>("MONTHPICKS_THROTTLE_MS")? {
        policy.throttle = Duration::from_millis(ms);
    }
    if let Some(max) = parsed::<u32>("MONTHPICKS_MAX_RETRIES")? {
        policy.max_retries = max;
    }
    if let Some(secs) = parsed::<u64>("MONTHPICKS_MAX_RETRY_AFTER_SECS")? {
        policy.max_retry_after = secs;
    }

    Ok(policy)
}
