//! Artist sources.
//!
//! A source yields the curated artists in a stable order. Both
//! implementations accept `spotify:artist:<id>` URIs, open.spotify.com artist
//! links and bare ids, and drop duplicates while keeping the first position.

mod file;
mod notion;

pub use file::FileArtistSource;
pub use notion::{NotionArtistSource, property_text};

use std::collections::HashSet;

use thiserror::Error;

use crate::{config::ConfigError, types::ArtistRef, utils, warning};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("request to notion failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notion responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("cannot read artist file {path}: {reason}")]
    File { path: String, reason: String },
}

#[allow(async_fn_in_trait)]
pub trait ArtistSource {
    /// Name used in user facing messages, e.g. `Notion`.
    fn name(&self) -> &str;

    async fn list_artists(&self) -> Result<Vec<ArtistRef>, SourceError>;
}

/// Turns raw references into unique artist refs, warning about entries that
/// do not look like a Spotify artist.
pub fn collect_artists<I>(raw: I) -> Vec<ArtistRef>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut artists = Vec::new();

    for entry in raw {
        match utils::parse_artist_reference(&entry) {
            Some(id) => {
                if seen.insert(id.clone()) {
                    artists.push(ArtistRef(id));
                }
            }
            None => warning!("Ignoring '{}': not a Spotify artist reference.", entry.trim()),
        }
    }

    artists
}
