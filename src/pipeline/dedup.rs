use std::collections::HashSet;

use indicatif::ProgressBar;

use super::progress_bar;
use crate::{
    spotify::{
        catalog::Catalog,
        gateway::{CredentialStore, Gateway, Outcome},
        ops::GetTrack,
    },
    types::TrackRef,
    utils,
};

/// `(primary artist id, normalized title)`.
pub type DedupKey = (String, String);

/// Case- and padding-insensitive form of a title. Inner whitespace and
/// punctuation are kept.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Key two tracks must share to count as the same song.
pub fn dedup_key(track: &TrackRef) -> DedupKey {
    (track.artist_id.clone(), normalize_title(&track.title))
}

/// First-seen-wins admission of tracks by URI and by [`DedupKey`].
#[derive(Debug, Default)]
pub struct Deduplicator {
    keys: HashSet<DedupKey>,
    uris: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `track` is the first of its kind.
    pub fn admit(&mut self, track: &TrackRef) -> bool {
        if self.uris.contains(&track.uri) {
            return false;
        }
        if !self.keys.insert(dedup_key(track)) {
            return false;
        }
        self.uris.insert(track.uri.clone());
        true
    }
}

/// Collapses tracks with equal URI or equal [`DedupKey`], keeping order.
pub fn dedup_tracks(tracks: Vec<TrackRef>) -> Vec<TrackRef> {
    let mut dedup = Deduplicator::new();
    tracks.into_iter().filter(|t| dedup.admit(t)).collect()
}

/// Resolves every URI to its track details and keeps the first track per
/// [`DedupKey`].
///
/// A track whose details cannot be fetched (retries exhausted or any error)
/// is dropped. [`super::unwanted::filter_unwanted`] keeps such tracks.
///
/// # Arguments
///
/// * `gateway` - Gateway used for the track lookups
/// * `uris` - Harvested URIs; the earlier of two equal songs survives
///
/// # Returns
///
/// The verified, unique tracks in input order.
pub async fn dedup<C: Catalog, S: CredentialStore>(
    gateway: &mut Gateway<C, S>,
    uris: Vec<String>,
) -> Vec<TrackRef> {
    let pb: ProgressBar = progress_bar(uris.len() as u64, "Removing duplicate tracks");
    let mut dedup = Deduplicator::new();
    let mut kept = Vec::new();

    for uri in uris {
        pb.inc(1);

        let op = GetTrack {
            id: utils::track_id_from_uri(&uri),
        };
        let track = match gateway.send(&op).await {
            Ok(Outcome::Done(track)) => track,
            Ok(Outcome::Exhausted { .. }) => continue,
            Err(e) => {
                pb.set_message(format!("Skipping {}: {}", uri, e));
                continue;
            }
        };

        let mut track = TrackRef::from(&track);
        // keep the harvested identifier even if the catalog relinked it
        track.uri = uri;

        if dedup.admit(&track) {
            kept.push(track);
        }
    }

    pb.finish_and_clear();
    kept
}
