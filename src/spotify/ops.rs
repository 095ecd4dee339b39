//! Logical catalog requests.
//!
//! Each operation is a small value describing one request. The gateway may
//! send the same value several times (rate-limit retries, resubmission after a
//! credential refresh), so `send` only borrows it.

use super::catalog::{Catalog, CatalogError};
use crate::{
    types::{Album, Artist, CreatePlaylistRequest, Page, Playlist, SimplifiedTrack, Track, User},
    utils::ReleaseKind,
};

/// One logical request against a [`Catalog`].
///
/// # Example
///
/// ```
/// let op = AlbumTracks { album_id: &album.id, limit: 50 };
/// if let Outcome::Done(page) = gateway.send(&op).await? {
///     println!("{} tracks", page.items.len());
/// }
/// ```
#[allow(async_fn_in_trait)]
pub trait Operation<C: Catalog> {
    /// Value produced by a successful request.
    type Output;

    /// Short human readable description used in retry narration.
    fn describe(&self) -> String;

    /// Performs exactly one physical request with `token`.
    async fn send(&self, catalog: &C, token: &str) -> Result<Self::Output, CatalogError>;
}

/// One page of an artist's releases of one kind.
pub struct ArtistAlbums<'a> {
    pub artist_id: &'a str,
    pub kind: ReleaseKind,
    pub limit: u32,
    pub offset: u32,
}

impl<C: Catalog> Operation<C> for ArtistAlbums<'_> {
    type Output = Page<Album>;

    fn describe(&self) -> String {
        format!(
            "{} releases of artist {} (offset {})",
            self.kind, self.artist_id, self.offset
        )
    }

    async fn send(&self, catalog: &C, token: &str) -> Result<Self::Output, CatalogError> {
        catalog
            .artist_albums(token, self.artist_id, self.kind, self.limit, self.offset)
            .await
    }
}

/// Track listing of a release, truncated to `limit` entries.
pub struct AlbumTracks<'a> {
    pub album_id: &'a str,
    pub limit: u32,
}

impl<C: Catalog> Operation<C> for AlbumTracks<'_> {
    type Output = Page<SimplifiedTrack>;

    fn describe(&self) -> String {
        format!("tracks of album {}", self.album_id)
    }

    async fn send(&self, catalog: &C, token: &str) -> Result<Self::Output, CatalogError> {
        catalog.album_tracks(token, self.album_id, self.limit).await
    }
}

/// Full track objects for a batch of at most 50 ids.
pub struct SeveralTracks<'a> {
    pub ids: &'a [String],
}

impl<C: Catalog> Operation<C> for SeveralTracks<'_> {
    type Output = Vec<Track>;

    fn describe(&self) -> String {
        format!("details of {} tracks", self.ids.len())
    }

    async fn send(&self, catalog: &C, token: &str) -> Result<Self::Output, CatalogError> {
        catalog.tracks(token, self.ids).await
    }
}

pub struct GetTrack<'a> {
    pub id: &'a str,
}

impl<C: Catalog> Operation<C> for GetTrack<'_> {
    type Output = Track;

    fn describe(&self) -> String {
        format!("track {}", self.id)
    }

    async fn send(&self, catalog: &C, token: &str) -> Result<Self::Output, CatalogError> {
        catalog.track(token, self.id).await
    }
}

/// Artist details for a batch of at most 50 ids.
pub struct SeveralArtists<'a> {
    pub ids: &'a [String],
}

impl<C: Catalog> Operation<C> for SeveralArtists<'_> {
    type Output = Vec<Artist>;

    fn describe(&self) -> String {
        format!("details of {} artists", self.ids.len())
    }

    async fn send(&self, catalog: &C, token: &str) -> Result<Self::Output, CatalogError> {
        catalog.artists(token, self.ids).await
    }
}

/// Profile of the token's owner.
pub struct CurrentUser;

impl<C: Catalog> Operation<C> for CurrentUser {
    type Output = User;

    fn describe(&self) -> String {
        "current user".to_string()
    }

    async fn send(&self, catalog: &C, token: &str) -> Result<Self::Output, CatalogError> {
        catalog.current_user(token).await
    }
}

/// One page of a user's playlists.
pub struct UserPlaylists<'a> {
    pub user_id: &'a str,
    pub limit: u32,
    pub offset: u32,
}

impl<C: Catalog> Operation<C> for UserPlaylists<'_> {
    type Output = Page<Playlist>;

    fn describe(&self) -> String {
        format!("playlists of user {} (offset {})", self.user_id, self.offset)
    }

    async fn send(&self, catalog: &C, token: &str) -> Result<Self::Output, CatalogError> {
        catalog
            .user_playlists(token, self.user_id, self.limit, self.offset)
            .await
    }
}

/// Creates a playlist for `user_id`.
///
/// Not idempotent. It is only resubmitted after a 401, which creates nothing.
pub struct CreatePlaylist<'a> {
    pub user_id: &'a str,
    pub request: CreatePlaylistRequest,
}

impl<C: Catalog> Operation<C> for CreatePlaylist<'_> {
    type Output = Playlist;

    fn describe(&self) -> String {
        format!("creation of playlist '{}'", self.request.name)
    }

    async fn send(&self, catalog: &C, token: &str) -> Result<Self::Output, CatalogError> {
        catalog
            .create_playlist(token, self.user_id, &self.request)
            .await
    }
}

/// Appends a chunk of at most 50 URIs to a playlist.
pub struct AddTracks<'a> {
    pub playlist_id: &'a str,
    pub uris: &'a [String],
}

impl<C: Catalog> Operation<C> for AddTracks<'_> {
    type Output = String;

    fn describe(&self) -> String {
        format!(
            "append of {} tracks to playlist {}",
            self.uris.len(),
            self.playlist_id
        )
    }

    async fn send(&self, catalog: &C, token: &str) -> Result<Self::Output, CatalogError> {
        catalog.add_tracks(token, self.playlist_id, self.uris).await
    }
}
