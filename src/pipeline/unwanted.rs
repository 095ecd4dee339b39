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

/// Markers of re-releases and alternate versions. Matched case-insensitively
/// as substrings of the track title and of the release title.
pub const BLACKLIST: [&str; 16] = [
    "instrumental",
    "acoustic",
    "live",
    "karaoke",
    "remix",
    "cover",
    "remaster",
    "edition",
    "version",
    "session",
    "demo",
    "mix",
    "track",
    "original",
    "edit",
    "extended",
];

/// Returns the first blacklist marker found in `text`.
pub fn find_marker(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    BLACKLIST.into_iter().find(|marker| text.contains(marker))
}

/// Whether the track title or its release title carries a marker.
pub fn is_unwanted(track: &TrackRef) -> bool {
    find_marker(&track.title).is_some() || find_marker(&track.release_title).is_some()
}

pub fn filter_unwanted_tracks(tracks: Vec<TrackRef>) -> Vec<TrackRef> {
    tracks.into_iter().filter(|t| !is_unwanted(t)).collect()
}

/// Re-fetches every track and drops those carrying a blacklist marker in
/// their title or their release's title.
///
/// A track whose details cannot be fetched is kept, the reverse of
/// [`super::dedup::dedup`].
///
/// # Returns
///
/// The kept tracks unchanged and in input order. Only the decision uses the
/// fresh lookup.
pub async fn filter_unwanted<C: Catalog, S: CredentialStore>(
    gateway: &mut Gateway<C, S>,
    tracks: Vec<TrackRef>,
) -> Vec<TrackRef> {
    let pb = progress_bar(tracks.len() as u64, "Filtering unwanted tracks");
    let mut kept = Vec::with_capacity(tracks.len());

    for track in tracks {
        pb.inc(1);

        let op = GetTrack {
            id: utils::track_id_from_uri(&track.uri),
        };
        let wanted = match gateway.send(&op).await {
            Ok(Outcome::Done(details)) => !is_unwanted(&TrackRef::from(&details)),
            Ok(Outcome::Exhausted { .. }) => true,
            Err(e) => {
                pb.set_message(format!("Keeping unverified {}: {}", track.uri, e));
                true
            }
        };

        if wanted {
            kept.push(track);
        }
    }

    pb.finish_and_clear();
    kept
}
