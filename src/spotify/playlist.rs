use thiserror::Error;

use super::{
    catalog::Catalog,
    gateway::{CredentialStore, Gateway, GatewayError, Outcome},
    ops::{AddTracks, CreatePlaylist, CurrentUser, UserPlaylists},
};
use crate::{
    info,
    types::{CreatePlaylistRequest, Playlist},
};

pub const PLAYLIST_DESCRIPTION: &str = "Monthly playlist generated automatically.";
pub const PLAYLIST_PAGE_SIZE: u32 = 50;
pub const APPEND_BATCH_SIZE: usize = 50;

/// Failure of the playlist sink. Unlike the harvest, the sink treats an
/// abandoned request as fatal.
#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("gave up on {0} after repeated rate limiting")]
    Exhausted(String),
}

/// What [`create_or_update`] did to the monthly playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistUpdate {
    pub playlist_id: String,
    pub created: bool,
    pub tracks_added: usize,
}

fn required<T>(outcome: Outcome<T>, what: &str) -> Result<T, PlaylistError> {
    outcome
        .done()
        .ok_or_else(|| PlaylistError::Exhausted(what.to_string()))
}

/// Returns the catalog id of the account behind the gateway's token.
///
/// # Errors
///
/// [`PlaylistError::Exhausted`] when the lookup is abandoned after repeated
/// rate limiting, or the gateway error that ended it.
pub async fn current_user_id<C: Catalog, S: CredentialStore>(
    gateway: &mut Gateway<C, S>,
) -> Result<String, PlaylistError> {
    let user = required(gateway.send(&CurrentUser).await?, "current user lookup")?;
    Ok(user.id)
}

/// Looks for a playlist of `user_id` whose name equals `name` exactly,
/// paging through all of the user's playlists.
///
/// # Returns
///
/// The first matching playlist, or `None` once the last page was checked.
pub async fn find_by_name<C: Catalog, S: CredentialStore>(
    gateway: &mut Gateway<C, S>,
    user_id: &str,
    name: &str,
) -> Result<Option<Playlist>, PlaylistError> {
    let mut offset = 0;

    loop {
        let op = UserPlaylists {
            user_id,
            limit: PLAYLIST_PAGE_SIZE,
            offset,
        };
        let page = required(gateway.send(&op).await?, "playlist lookup")?;

        let is_last = page.items.is_empty() || page.next.is_none();
        if let Some(found) = page.items.into_iter().find(|p| p.name == name) {
            return Ok(Some(found));
        }
        if is_last {
            return Ok(None);
        }

        offset += PLAYLIST_PAGE_SIZE;
    }
}

/// Creates an empty playlist called `name` with the standard description.
///
/// # Arguments
///
/// * `gateway` - Gateway used for the request
/// * `user_id` - Owner of the new playlist
/// * `name` - Playlist name, usually `<Month> <Year>`
/// * `public` - Whether the playlist is listed on the user's profile
pub async fn create<C: Catalog, S: CredentialStore>(
    gateway: &mut Gateway<C, S>,
    user_id: &str,
    name: &str,
    public: bool,
) -> Result<Playlist, PlaylistError> {
    let op = CreatePlaylist {
        user_id,
        request: CreatePlaylistRequest {
            name: name.to_string(),
            description: PLAYLIST_DESCRIPTION.to_string(),
            public,
            collaborative: false,
        },
    };
    required(gateway.send(&op).await?, "playlist creation")
}

/// Appends `uris` in batches of [`APPEND_BATCH_SIZE`].
///
/// Batches are not transactional: a failure midway leaves the batches
/// already sent in the playlist.
///
/// # Returns
///
/// The number of URIs sent, equal to `uris.len()` on success.
pub async fn add_tracks<C: Catalog, S: CredentialStore>(
    gateway: &mut Gateway<C, S>,
    playlist_id: &str,
    uris: &[String],
) -> Result<usize, PlaylistError> {
    let mut added = 0;

    for chunk in uris.chunks(APPEND_BATCH_SIZE) {
        let op = AddTracks {
            playlist_id,
            uris: chunk,
        };
        required(gateway.send(&op).await?, "track append")?;
        added += chunk.len();
    }

    Ok(added)
}

/// Resolves the playlist named `name` (creating it when absent) and appends
/// `uris` to it.
///
/// # Arguments
///
/// * `gateway` - Gateway used for every request
/// * `name` - Exact name of the monthly playlist
/// * `uris` - Track URIs in playlist order
/// * `public` - Visibility used when the playlist has to be created
///
/// # Errors
///
/// Returns [`PlaylistError`] when any lookup, creation or append fails. An
/// existing playlist is never recreated or cleared.
pub async fn create_or_update<C: Catalog, S: CredentialStore>(
    gateway: &mut Gateway<C, S>,
    name: &str,
    uris: &[String],
    public: bool,
) -> Result<PlaylistUpdate, PlaylistError> {
    let user_id = current_user_id(gateway).await?;

    let (playlist, created) = match find_by_name(gateway, &user_id, name).await? {
        Some(existing) => {
            info!("Playlist {} already exists, appending tracks.", name);
            (existing, false)
        }
        None => {
            info!("Playlist {} not found, creating it.", name);
            (create(gateway, &user_id, name, public).await?, true)
        }
    };

    let tracks_added = add_tracks(gateway, &playlist.id, uris).await?;

    Ok(PlaylistUpdate {
        playlist_id: playlist.id,
        created,
        tracks_added,
    })
}
