//! # Spotify Integration Module
//!
//! Everything that talks to the Spotify Web API lives here:
//!
//! ```text
//! pipeline / cli
//!      ↓
//! gateway   (throttle, 429 backoff, 401 refresh-and-resubmit)
//!      ↓
//! ops       (one value per logical request)
//!      ↓
//! catalog   (one method per endpoint, one physical request each)
//!      ↓
//! Spotify Web API
//! ```
//!
//! - [`auth`] - OAuth 2.0 PKCE authorization and token refresh
//! - [`catalog`] - The [`catalog::Catalog`] trait and its reqwest implementation
//! - [`gateway`] - Rate-limited, credential-aware request execution
//! - [`ops`] - Logical requests (artist releases, album tracks, tracks, playlists)
//! - [`playlist`] - Playlist lookup, creation and batched appends
//!
//! ## Endpoints used
//!
//! - `GET /artists/{id}/albums` - releases of an artist, offset paginated
//! - `GET /albums/{id}/tracks` - tracks of a release
//! - `GET /tracks?ids=` and `GET /tracks/{id}` - track details
//! - `GET /artists?ids=` - artist details for listings
//! - `GET /me`, `GET /users/{id}/playlists` - playlist lookup
//! - `POST /users/{id}/playlists`, `POST /playlists/{id}/tracks` - playlist mutation

pub mod auth;
pub mod catalog;
pub mod gateway;
pub mod ops;
pub mod playlist;
