//! # CLI Module
//!
//! User-facing commands. Each command narrates its progress with the crate's
//! output macros and terminates through `error!` (exit status 1) when it
//! cannot complete:
//!
//! - [`auth`] - authorize with Spotify (PKCE) and store the token
//! - [`update`] - build last month's playlist from the curated artists
//! - [`artists`] - list the curated artists as the catalog knows them
//!
//! ```bash
//! monthpicks auth
//! monthpicks update
//! monthpicks update --artists-file artists.txt --dry-run
//! monthpicks artists
//! ```

mod artists;
mod auth;
mod update;

pub use artists::artists;
pub use auth::auth;
pub use update::update;

use std::path::PathBuf;

use crate::{
    Res, config,
    management::TokenManager,
    source::{ArtistSource, FileArtistSource, NotionArtistSource, SourceError},
    spotify::{catalog::SpotifyCatalog, gateway::Gateway},
    types::ArtistRef,
};

pub(crate) type SpotifyGateway = Gateway<SpotifyCatalog, TokenManager>;

async fn list_from<S: ArtistSource>(source: S) -> Result<(String, Vec<ArtistRef>), SourceError> {
    let artists = source.list_artists().await?;
    Ok((source.name().to_string(), artists))
}

/// Reads the curated artists from `artists_file` when given, from Notion
/// otherwise. Returns the source's display name along with the artists.
pub(crate) async fn load_artists(
    artists_file: Option<PathBuf>,
) -> Result<(String, Vec<ArtistRef>), SourceError> {
    match artists_file {
        Some(path) => list_from(FileArtistSource::new(path)).await,
        None => list_from(NotionArtistSource::from_config()?).await,
    }
}

/// Loads the stored token, refreshes it when it is about to expire and wraps
/// the Spotify catalog in a gateway configured from the environment.
pub(crate) async fn connect() -> Res<SpotifyGateway> {
    let mut token_mgr = TokenManager::load()
        .await
        .map_err(|e| format!("Failed to load token. Please run monthpicks auth\n Error: {}", e))?;
    token_mgr.ensure_fresh().await?;

    Ok(Gateway::new(
        SpotifyCatalog::new(config::spotify_apiurl()),
        token_mgr,
        config::retry_policy()?,
    ))
}
