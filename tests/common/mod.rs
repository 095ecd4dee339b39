#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::Duration,
};

use monthpicks::{
    Res,
    spotify::{
        catalog::{Catalog, CatalogError},
        gateway::{CredentialStore, Gateway, RetryPolicy},
    },
    types::{
        Album, AlbumArtist, Artist, CreatePlaylistRequest, Page, Playlist, SimplifiedTrack, Track,
        TrackAlbum, User,
    },
    utils::ReleaseKind,
};

/// In-memory catalog with scripted failures.
///
/// Failures are queued per request label (`albums:<artist>`, `album_tracks:<album>`,
/// `tracks`, `track:<id>`, `artists`, `me`, `playlists`, `create_playlist`,
/// `add_tracks`) and popped one per physical request.
#[derive(Default)]
pub struct FakeCatalog {
    pub albums: HashMap<String, Vec<Album>>,
    pub album_tracks: HashMap<String, Vec<SimplifiedTrack>>,
    pub tracks: HashMap<String, Track>,
    pub artists: HashMap<String, Artist>,
    pub playlists: Mutex<Vec<Playlist>>,
    pub created: Mutex<Vec<CreatePlaylistRequest>>,
    pub appended: Mutex<Vec<(String, Vec<String>)>>,
    failures: Mutex<HashMap<String, VecDeque<CatalogError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, label: &str, error: CatalogError) {
        self.failures
            .lock()
            .unwrap()
            .entry(label.to_string())
            .or_default()
            .push_back(error);
    }

    pub fn rate_limit(&self, label: &str, times: usize, retry_after: Option<u64>) {
        for _ in 0..times {
            self.fail(label, CatalogError::RateLimited { retry_after });
        }
    }

    /// Labels of all physical requests so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(label, _)| label.clone())
            .collect()
    }

    /// Bearer tokens used by all physical requests so far, in order.
    pub fn tokens(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, token)| token.clone())
            .collect()
    }

    pub fn count(&self, label: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == label).count()
    }

    /// Registers a release together with its tracks. Every track is credited
    /// to `artist_id` and can be looked up by id.
    pub fn add_release(
        &mut self,
        artist_id: &str,
        album: Album,
        tracks: &[(&str, &str)],
    ) {
        let album_id = album.id.clone();
        let album_name = album.name.clone();
        self.albums
            .entry(artist_id.to_string())
            .or_default()
            .push(album);

        let listed = self.album_tracks.entry(album_id.clone()).or_default();
        for (id, title) in tracks {
            listed.push(SimplifiedTrack {
                id: Some(id.to_string()),
                name: title.to_string(),
                uri: track_uri(id),
            });
            self.tracks.insert(
                id.to_string(),
                Track {
                    id: id.to_string(),
                    name: title.to_string(),
                    uri: track_uri(id),
                    artists: vec![AlbumArtist {
                        id: artist_id.to_string(),
                        name: format!("Artist {}", artist_id),
                    }],
                    album: TrackAlbum {
                        id: album_id.clone(),
                        name: album_name.clone(),
                    },
                },
            );
        }
    }

    fn enter(&self, label: String, token: &str) -> Result<(), CatalogError> {
        self.calls
            .lock()
            .unwrap()
            .push((label.clone(), token.to_string()));

        match self
            .failures
            .lock()
            .unwrap()
            .get_mut(&label)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn page<T: Clone>(items: &[T], limit: u32, offset: u32) -> Page<T> {
    let start = (offset as usize).min(items.len());
    let end = (start + limit as usize).min(items.len());
    Page {
        items: items[start..end].to_vec(),
        next: (end < items.len()).then(|| format!("offset={}", end)),
        total: Some(items.len() as u64),
    }
}

impl Catalog for FakeCatalog {
    async fn artist_albums(
        &self,
        token: &str,
        artist_id: &str,
        kind: ReleaseKind,
        limit: u32,
        offset: u32,
    ) -> Result<Page<Album>, CatalogError> {
        self.enter(format!("albums:{}", artist_id), token)?;
        let matching: Vec<Album> = self
            .albums
            .get(artist_id)
            .map(|albums| {
                albums
                    .iter()
                    .filter(|a| a.album_type == kind.as_str())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(page(&matching, limit, offset))
    }

    async fn album_tracks(
        &self,
        token: &str,
        album_id: &str,
        limit: u32,
    ) -> Result<Page<SimplifiedTrack>, CatalogError> {
        self.enter(format!("album_tracks:{}", album_id), token)?;
        let tracks = self.album_tracks.get(album_id).cloned().unwrap_or_default();
        Ok(page(&tracks, limit, 0))
    }

    async fn tracks(&self, token: &str, ids: &[String]) -> Result<Vec<Track>, CatalogError> {
        self.enter("tracks".to_string(), token)?;
        Ok(ids
            .iter()
            .filter_map(|id| self.tracks.get(id).cloned())
            .collect())
    }

    async fn track(&self, token: &str, id: &str) -> Result<Track, CatalogError> {
        self.enter(format!("track:{}", id), token)?;
        self.tracks.get(id).cloned().ok_or(CatalogError::Status {
            status: 404,
            body: "non existing id".to_string(),
        })
    }

    async fn artists(&self, token: &str, ids: &[String]) -> Result<Vec<Artist>, CatalogError> {
        self.enter("artists".to_string(), token)?;
        Ok(ids
            .iter()
            .filter_map(|id| self.artists.get(id).cloned())
            .collect())
    }

    async fn current_user(&self, token: &str) -> Result<User, CatalogError> {
        self.enter("me".to_string(), token)?;
        Ok(User {
            id: "listener".to_string(),
            display_name: Some("Listener".to_string()),
        })
    }

    async fn user_playlists(
        &self,
        token: &str,
        _user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<Playlist>, CatalogError> {
        self.enter("playlists".to_string(), token)?;
        Ok(page(&self.playlists.lock().unwrap(), limit, offset))
    }

    async fn create_playlist(
        &self,
        token: &str,
        _user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<Playlist, CatalogError> {
        self.enter("create_playlist".to_string(), token)?;
        let mut playlists = self.playlists.lock().unwrap();
        let playlist = Playlist {
            id: format!("pl{}", playlists.len() + 1),
            name: request.name.clone(),
            description: Some(request.description.clone()),
            public: Some(request.public),
            collaborative: request.collaborative,
            snapshot_id: "snap0".to_string(),
        };
        playlists.push(playlist.clone());
        self.created.lock().unwrap().push(request.clone());
        Ok(playlist)
    }

    async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<String, CatalogError> {
        self.enter("add_tracks".to_string(), token)?;
        let mut appended = self.appended.lock().unwrap();
        appended.push((playlist_id.to_string(), uris.to_vec()));
        Ok(format!("snap{}", appended.len()))
    }
}

/// Credential store handing out `token-<n>` after the n-th refresh.
#[derive(Default)]
pub struct FakeStore {
    pub refreshes: u32,
    pub fail_refresh: bool,
}

impl CredentialStore for FakeStore {
    fn access_token(&self) -> String {
        format!("token-{}", self.refreshes)
    }

    async fn refresh(&mut self) -> Res<String> {
        if self.fail_refresh {
            return Err("refresh token revoked".into());
        }
        self.refreshes += 1;
        Ok(self.access_token())
    }
}

pub type FakeGateway = Gateway<FakeCatalog, FakeStore>;

pub fn gateway(catalog: FakeCatalog) -> FakeGateway {
    Gateway::new(catalog, FakeStore::default(), RetryPolicy::default())
}

/// Policy without the per-request pause, for tests that only care about
/// what ends up in the result.
pub fn quick_gateway(catalog: FakeCatalog) -> FakeGateway {
    let policy = RetryPolicy {
        throttle: Duration::ZERO,
        ..RetryPolicy::default()
    };
    Gateway::new(catalog, FakeStore::default(), policy)
}

pub fn track_uri(id: &str) -> String {
    format!("spotify:track:{}", id)
}

pub fn album(id: &str, name: &str, album_type: &str, release_date: &str) -> Album {
    let precision = match release_date.split('-').count() {
        1 => "year",
        2 => "month",
        _ => "day",
    };
    Album {
        id: id.to_string(),
        name: name.to_string(),
        release_date: release_date.to_string(),
        release_date_precision: precision.to_string(),
        album_type: album_type.to_string(),
        artists: Vec::new(),
    }
}

pub fn stored_playlist(id: &str, name: &str) -> Playlist {
    Playlist {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        public: Some(true),
        collaborative: false,
        snapshot_id: "snap0".to_string(),
    }
}
