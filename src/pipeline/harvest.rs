use std::{collections::HashSet, time::Duration};

use tokio::time::timeout;

use super::window::ReleaseWindow;
use crate::{
    info,
    spotify::{
        catalog::Catalog,
        gateway::{CredentialStore, Gateway, GatewayError, Outcome},
        ops::{AlbumTracks, ArtistAlbums, SeveralTracks},
    },
    types::{Album, ArtistRef},
    utils::ReleaseKind,
    warning,
};

/// Releases requested per page of an artist's discography.
pub const RELEASE_PAGE_SIZE: u32 = 20;
pub const ALBUM_TRACKS_LIMIT: u32 = 50;
pub const TRACK_BATCH_SIZE: usize = 50;

/// Collects the track URIs of every `kind` release the given artists put out
/// inside `window`.
///
/// Artists are processed one after another in source order. A failing artist
/// is reported and skipped; it never aborts the harvest. URIs are unique in
/// the result, first occurrence wins.
///
/// # Arguments
///
/// * `gateway` - Gateway used for every request
/// * `artists` - Artists to harvest, in order
/// * `kind` - Release kind to look at
/// * `window` - Only releases dated inside it are opened
/// * `artist_timeout` - When set, an artist taking longer is abandoned and
///   the harvest moves on to the next one
///
/// # Returns
///
/// Track URIs in artist order, then release order, then track order.
pub async fn harvest<C: Catalog, S: CredentialStore>(
    gateway: &mut Gateway<C, S>,
    artists: &[ArtistRef],
    kind: ReleaseKind,
    window: &ReleaseWindow,
    artist_timeout: Option<Duration>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut uris = Vec::new();

    for artist in artists {
        let result = match artist_timeout {
            Some(limit) => match timeout(limit, harvest_artist(gateway, artist, kind, window)).await
            {
                Ok(result) => result,
                Err(_) => {
                    warning!(
                        "Fetching {} releases for artist {} took longer than {} seconds. Skipping...",
                        kind,
                        artist,
                        limit.as_secs()
                    );
                    continue;
                }
            },
            None => harvest_artist(gateway, artist, kind, window).await,
        };

        match result {
            Ok(found) => {
                for uri in found {
                    if seen.insert(uri.clone()) {
                        uris.push(uri);
                    }
                }
            }
            Err(e) => warning!(
                "Error fetching data for artist: {}. Skipping... ({})",
                artist,
                e
            ),
        }
    }

    uris
}

/// Harvests a single artist. Exhausted requests drop only the page, release
/// or batch they belong to; any error drops the whole artist.
///
/// # Errors
///
/// The first [`GatewayError`] hit while listing releases, reading release
/// tracks or resolving track batches. An expired credential is refreshed by
/// the gateway and only reported when the refresh fails.
pub async fn harvest_artist<C: Catalog, S: CredentialStore>(
    gateway: &mut Gateway<C, S>,
    artist: &ArtistRef,
    kind: ReleaseKind,
    window: &ReleaseWindow,
) -> Result<Vec<String>, GatewayError> {
    let releases: Vec<Album> = list_releases(gateway, artist, kind)
        .await?
        .into_iter()
        .filter(|album| window.contains_release(album))
        .collect();

    let mut track_ids: Vec<String> = Vec::new();
    for album in &releases {
        info!("Processing {}: {}...", kind, album.name);

        let op = AlbumTracks {
            album_id: &album.id,
            limit: ALBUM_TRACKS_LIMIT,
        };
        match gateway.send(&op).await? {
            Outcome::Done(page) => track_ids.extend(page.items.into_iter().filter_map(|t| t.id)),
            Outcome::Exhausted { .. } => warning!(
                "Maximum retries exceeded for album tracks. Skipping {}: {}",
                kind,
                album.name
            ),
        }
    }

    let mut uris = Vec::new();
    for batch in track_ids.chunks(TRACK_BATCH_SIZE) {
        match gateway.send(&SeveralTracks { ids: batch }).await? {
            Outcome::Done(tracks) => uris.extend(tracks.into_iter().map(|t| t.uri)),
            Outcome::Exhausted { .. } => {
                warning!("Maximum retries exceeded for track details. Skipping batch...")
            }
        }
    }

    Ok(uris)
}

/// Pages through the artist's `kind` releases until an empty page comes back.
/// When a page is abandoned after repeated rate limiting, the releases
/// collected so far are kept.
async fn list_releases<C: Catalog, S: CredentialStore>(
    gateway: &mut Gateway<C, S>,
    artist: &ArtistRef,
    kind: ReleaseKind,
) -> Result<Vec<Album>, GatewayError> {
    let mut offset = 0;
    let mut releases = Vec::new();

    loop {
        let op = ArtistAlbums {
            artist_id: artist.id(),
            kind,
            limit: RELEASE_PAGE_SIZE,
            offset,
        };

        match gateway.send(&op).await? {
            Outcome::Done(page) => {
                if page.items.is_empty() {
                    break;
                }
                releases.extend(page.items);
                offset += RELEASE_PAGE_SIZE;
            }
            Outcome::Exhausted { .. } => {
                warning!(
                    "Giving up on further {} pages for artist {} ({} releases fetched).",
                    kind,
                    artist,
                    releases.len()
                );
                break;
            }
        }
    }

    Ok(releases)
}
