use reqwest::{Client, Response, StatusCode, header::HeaderMap};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, Album, Artist,
        CreatePlaylistRequest, Page, Playlist, SeveralArtistsResponse, SeveralTracksResponse,
        SimplifiedTrack, Track, User,
    },
    utils::ReleaseKind,
};

/// Failure of a single physical request against the catalog.
///
/// A rate-limit response carries the server's `Retry-After` hint with it, so
/// the gateway never has to look at the headers of an earlier response.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("rate limited by the catalog (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },
    #[error("access token expired or revoked")]
    Unauthorized,
    #[error("catalog responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("cannot decode catalog response: {0}")]
    Decode(String),
}

/// The catalog operations the job needs, one method per endpoint.
///
/// Every method performs exactly one physical request. Throttling, retries
/// and credential refresh live in [`super::gateway::Gateway`].
///
/// # Errors
///
/// All methods share the same failure mapping:
///
/// - `429` becomes [`CatalogError::RateLimited`] with the `Retry-After` hint
/// - `401` becomes [`CatalogError::Unauthorized`]
/// - any other non-2xx status becomes [`CatalogError::Status`]
/// - transport and body decoding problems become [`CatalogError::Http`] or
///   [`CatalogError::Decode`]
#[allow(async_fn_in_trait)]
pub trait Catalog {
    /// Fetches one page of an artist's releases of the given kind.
    ///
    /// # Arguments
    ///
    /// * `token` - Bearer token for the request
    /// * `artist_id` - Catalog id of the artist
    /// * `kind` - Release group to list (`single` or `album`)
    /// * `limit` - Page size, at most 50
    /// * `offset` - Index of the first release on the page
    ///
    /// # Returns
    ///
    /// The page of releases. An empty page means the listing is exhausted.
    async fn artist_albums(
        &self,
        token: &str,
        artist_id: &str,
        kind: ReleaseKind,
        limit: u32,
        offset: u32,
    ) -> Result<Page<Album>, CatalogError>;

    /// Fetches the first `limit` tracks of a release. Releases with more
    /// tracks than that are truncated.
    async fn album_tracks(
        &self,
        token: &str,
        album_id: &str,
        limit: u32,
    ) -> Result<Page<SimplifiedTrack>, CatalogError>;

    /// Fetches full track objects for up to 50 ids per call.
    ///
    /// # Returns
    ///
    /// The known tracks in request order. Unknown ids are dropped from the
    /// result instead of failing the call.
    async fn tracks(&self, token: &str, ids: &[String]) -> Result<Vec<Track>, CatalogError>;

    /// Fetches a single track. An unknown id answers with a `404`
    /// [`CatalogError::Status`].
    async fn track(&self, token: &str, id: &str) -> Result<Track, CatalogError>;

    /// Fetches artist details for up to 50 ids per call. Unknown ids are
    /// dropped from the result.
    async fn artists(&self, token: &str, ids: &[String]) -> Result<Vec<Artist>, CatalogError>;

    /// Returns the profile of the account the token belongs to.
    async fn current_user(&self, token: &str) -> Result<User, CatalogError>;

    /// Fetches one page of the playlists owned or followed by `user_id`.
    ///
    /// # Arguments
    ///
    /// * `token` - Bearer token for the request
    /// * `user_id` - Catalog id of the playlist owner
    /// * `limit` - Page size, at most 50
    /// * `offset` - Index of the first playlist on the page
    async fn user_playlists(
        &self,
        token: &str,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<Playlist>, CatalogError>;

    /// Creates a playlist owned by `user_id` and returns it as stored by the
    /// catalog, including its new id.
    async fn create_playlist(
        &self,
        token: &str,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<Playlist, CatalogError>;

    /// Appends up to 50 URIs to the end of a playlist.
    ///
    /// # Returns
    ///
    /// The playlist's snapshot id after the append.
    async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<String, CatalogError>;
}

/// Reads the `Retry-After` header as whole seconds.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// [`Catalog`] backed by the Spotify Web API.
pub struct SpotifyCatalog {
    client: Client,
    base_url: String,
}

impl SpotifyCatalog {
    /// Creates a catalog client for the API rooted at `base_url`. A trailing
    /// slash is ignored.
    ///
    /// # Example
    ///
    /// ```
    /// let catalog = SpotifyCatalog::new(config::spotify_apiurl());
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, token: &str, path: &str) -> Result<T, CatalogError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn post<B, T>(&self, token: &str, path: &str, body: &B) -> Result<T, CatalogError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Maps the response status onto [`CatalogError`] and decodes the body of
    /// successful responses.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CatalogError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CatalogError::RateLimited {
                retry_after: parse_retry_after(response.headers()),
            });
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(CatalogError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

impl Catalog for SpotifyCatalog {
    async fn artist_albums(
        &self,
        token: &str,
        artist_id: &str,
        kind: ReleaseKind,
        limit: u32,
        offset: u32,
    ) -> Result<Page<Album>, CatalogError> {
        let path = format!(
            "/artists/{id}/albums?include_groups={include_groups}&limit={limit}&offset={offset}",
            id = artist_id,
            include_groups = kind,
            limit = limit,
            offset = offset
        );
        self.get(token, &path).await
    }

    async fn album_tracks(
        &self,
        token: &str,
        album_id: &str,
        limit: u32,
    ) -> Result<Page<SimplifiedTrack>, CatalogError> {
        let path = format!("/albums/{id}/tracks?limit={limit}", id = album_id);
        self.get(token, &path).await
    }

    async fn tracks(&self, token: &str, ids: &[String]) -> Result<Vec<Track>, CatalogError> {
        let path = format!("/tracks?ids={ids}", ids = ids.join(","));
        let res: SeveralTracksResponse = self.get(token, &path).await?;
        Ok(res.tracks.into_iter().flatten().collect())
    }

    async fn track(&self, token: &str, id: &str) -> Result<Track, CatalogError> {
        self.get(token, &format!("/tracks/{id}")).await
    }

    async fn artists(&self, token: &str, ids: &[String]) -> Result<Vec<Artist>, CatalogError> {
        let path = format!("/artists?ids={ids}", ids = ids.join(","));
        let res: SeveralArtistsResponse = self.get(token, &path).await?;
        Ok(res.artists.into_iter().flatten().collect())
    }

    async fn current_user(&self, token: &str) -> Result<User, CatalogError> {
        self.get(token, "/me").await
    }

    async fn user_playlists(
        &self,
        token: &str,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<Playlist>, CatalogError> {
        let path = format!("/users/{user_id}/playlists?limit={limit}&offset={offset}");
        self.get(token, &path).await
    }

    async fn create_playlist(
        &self,
        token: &str,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<Playlist, CatalogError> {
        self.post(token, &format!("/users/{user_id}/playlists"), request)
            .await
    }

    async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<String, CatalogError> {
        let body = AddTrackToPlaylistRequest {
            uris: uris.to_vec(),
        };
        let res: AddTrackToPlaylistResponse = self
            .post(token, &format!("/playlists/{playlist_id}/tracks"), &body)
            .await?;
        Ok(res.snapshot_id)
    }
}
