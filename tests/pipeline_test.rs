mod common;

use std::time::Duration;

use chrono::NaiveDate;
use common::{FakeCatalog, album, quick_gateway, track_uri};
use monthpicks::{
    pipeline::{
        self, ReleaseWindow,
        dedup::{self, dedup_key, dedup_tracks, normalize_title},
        harvest,
        unwanted::{self, filter_unwanted_tracks, find_marker, is_unwanted},
    },
    spotify::catalog::CatalogError,
    types::{Album, ArtistRef, TrackRef},
    utils::{ReleaseKind, ReleaseKinds},
};
use proptest::prelude::*;

fn march_2025() -> ReleaseWindow {
    ReleaseWindow::previous_month(NaiveDate::from_ymd_opt(2025, 4, 10).unwrap())
}

fn track_ref(id: &str, title: &str, release_title: &str, artist_id: &str) -> TrackRef {
    TrackRef {
        uri: track_uri(id),
        title: title.to_string(),
        release_title: release_title.to_string(),
        artist_id: artist_id.to_string(),
    }
}

fn server_error() -> CatalogError {
    CatalogError::Status {
        status: 502,
        body: "bad gateway".to_string(),
    }
}

/// One artist with a single and two albums in March 2025 plus an album from
/// January that must never show up.
fn spring_catalog() -> FakeCatalog {
    let mut catalog = FakeCatalog::new();
    catalog.add_release("a1", album("s1", "Song", "single", "2025-03-05"), &[("t1", "Song")]);
    catalog.add_release(
        "a1",
        album("al1", "Spring", "album", "2025-03-31"),
        &[("t2", "song "), ("t3", "Song (Live)"), ("t4", "Bloom")],
    );
    catalog.add_release(
        "a1",
        album("al2", "Spring (Remastered Edition)", "album", "2025-03"),
        &[("t5", "Rain")],
    );
    catalog.add_release("a1", album("old", "Winter", "album", "2025-01-15"), &[("t9", "Frost")]);
    catalog
}

#[tokio::test(start_paused = true)]
async fn test_harvest_keeps_only_releases_in_window() {
    let mut gateway = quick_gateway(spring_catalog());
    let artists = vec![ArtistRef("a1".to_string())];

    let uris = harvest::harvest(&mut gateway, &artists, ReleaseKind::Album, &march_2025(), None)
        .await;

    assert_eq!(
        uris,
        vec![track_uri("t2"), track_uri("t3"), track_uri("t4"), track_uri("t5")]
    );
    assert_eq!(gateway.catalog().count("album_tracks:old"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_harvest_skips_failing_artist() {
    let mut catalog = spring_catalog();
    catalog.add_release("a2", album("s2", "Other", "single", "2025-03-12"), &[("t7", "Other")]);
    catalog.fail("albums:a1", server_error());
    let mut gateway = quick_gateway(catalog);
    let artists = vec![ArtistRef("a1".to_string()), ArtistRef("a2".to_string())];

    let uris = harvest::harvest(&mut gateway, &artists, ReleaseKind::Single, &march_2025(), None)
        .await;

    assert_eq!(uris, vec![track_uri("t7")]);
}

#[tokio::test(start_paused = true)]
async fn test_harvest_skips_release_after_exhaustion() {
    let catalog = spring_catalog();
    catalog.rate_limit("album_tracks:al1", 4, Some(1));
    let mut gateway = quick_gateway(catalog);
    let artists = vec![ArtistRef("a1".to_string())];

    let uris = harvest::harvest(&mut gateway, &artists, ReleaseKind::Album, &march_2025(), None)
        .await;

    assert_eq!(uris, vec![track_uri("t5")]);
}

#[tokio::test(start_paused = true)]
async fn test_harvest_pages_through_releases() {
    let mut catalog = FakeCatalog::new();
    for i in 0..25 {
        let id = format!("al{}", i);
        let track_id = format!("t{}", i);
        catalog.add_release(
            "a1",
            album(&id, &format!("Album {}", i), "album", "2025-03-15"),
            &[(track_id.as_str(), "Tune")],
        );
    }
    let mut gateway = quick_gateway(catalog);
    let artists = vec![ArtistRef("a1".to_string())];

    let uris = harvest::harvest(&mut gateway, &artists, ReleaseKind::Album, &march_2025(), None)
        .await;

    assert_eq!(uris.len(), 25);
    // two full pages and the empty page that ends the listing
    assert_eq!(gateway.catalog().count("albums:a1"), 3);
}

/// Registers `count` tracks on one release, ids `<prefix>0`, `<prefix>1`...
fn add_numbered_release(
    catalog: &mut FakeCatalog,
    artist_id: &str,
    release: Album,
    prefix: &str,
    count: usize,
) {
    let ids: Vec<String> = (0..count).map(|i| format!("{}{}", prefix, i)).collect();
    let tracks: Vec<(&str, &str)> = ids.iter().map(|id| (id.as_str(), "Tune")).collect();
    catalog.add_release(artist_id, release, &tracks);
}

#[tokio::test(start_paused = true)]
async fn test_harvest_refreshes_expired_credential_mid_artist() {
    let mut catalog = FakeCatalog::new();
    add_numbered_release(&mut catalog, "a1", album("al1", "First", "album", "2025-03-03"), "x", 30);
    add_numbered_release(&mut catalog, "a1", album("al2", "Second", "album", "2025-03-20"), "y", 30);
    catalog.fail("album_tracks:al2", CatalogError::Unauthorized);
    let mut gateway = quick_gateway(catalog);
    let artists = vec![ArtistRef("a1".to_string())];

    let uris = harvest::harvest(&mut gateway, &artists, ReleaseKind::Album, &march_2025(), None)
        .await;

    // nothing of the artist is lost to the refresh
    assert_eq!(uris.len(), 60);
    assert_eq!(uris[0], track_uri("x0"));
    assert_eq!(uris[59], track_uri("y29"));
    assert_eq!(gateway.store().refreshes, 1);
    assert_eq!(gateway.catalog().count("album_tracks:al2"), 2);

    // the resubmission and everything after it carries the new token
    let calls = gateway.catalog().calls();
    let tokens = gateway.catalog().tokens();
    let first_al2 = calls.iter().position(|c| c == "album_tracks:al2").unwrap();
    assert_eq!(tokens[first_al2], "token-0");
    assert!(tokens[first_al2 + 1..].iter().all(|t| t == "token-1"));
}

#[tokio::test(start_paused = true)]
async fn test_harvest_batches_track_lookups() {
    let mut catalog = FakeCatalog::new();
    add_numbered_release(&mut catalog, "a1", album("al1", "First", "album", "2025-03-03"), "x", 30);
    add_numbered_release(&mut catalog, "a1", album("al2", "Second", "album", "2025-03-20"), "y", 30);
    let mut gateway = quick_gateway(catalog);
    let artists = vec![ArtistRef("a1".to_string())];

    let uris = harvest::harvest(&mut gateway, &artists, ReleaseKind::Album, &march_2025(), None)
        .await;

    assert_eq!(uris.len(), 60);
    // 60 ids go out as a batch of 50 and a batch of 10
    assert_eq!(gateway.catalog().count("tracks"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_harvest_skips_artist_past_timeout() {
    let mut catalog = FakeCatalog::new();
    catalog.add_release("a1", album("s1", "Slow", "single", "2025-03-05"), &[("t1", "Slow")]);
    catalog.add_release("a2", album("s2", "Fast", "single", "2025-03-12"), &[("t2", "Fast")]);
    // the first backoff alone outlasts the per-artist limit
    catalog.rate_limit("albums:a1", 3, Some(10));
    let mut gateway = quick_gateway(catalog);
    let artists = vec![ArtistRef("a1".to_string()), ArtistRef("a2".to_string())];

    let uris = harvest::harvest(
        &mut gateway,
        &artists,
        ReleaseKind::Single,
        &march_2025(),
        Some(Duration::from_secs(5)),
    )
    .await;

    assert_eq!(uris, vec![track_uri("t2")]);
    assert_eq!(gateway.catalog().count("album_tracks:s1"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dedup_keeps_first_of_equal_titles() {
    let mut gateway = quick_gateway(spring_catalog());
    let uris = vec![track_uri("t1"), track_uri("t2"), track_uri("t4")];

    let kept = dedup::dedup(&mut gateway, uris).await;

    let kept_uris: Vec<&str> = kept.iter().map(|t| t.uri.as_str()).collect();
    assert_eq!(kept_uris, vec!["spotify:track:t1", "spotify:track:t4"]);
}

#[tokio::test(start_paused = true)]
async fn test_dedup_drops_unverified_tracks() {
    let catalog = spring_catalog();
    catalog.fail("track:t1", server_error());
    catalog.rate_limit("track:t4", 4, Some(1));
    let mut gateway = quick_gateway(catalog);

    let kept = dedup::dedup(
        &mut gateway,
        vec![track_uri("t1"), track_uri("t4"), track_uri("t5")],
    )
    .await;

    let kept_uris: Vec<&str> = kept.iter().map(|t| t.uri.as_str()).collect();
    assert_eq!(kept_uris, vec!["spotify:track:t5"]);
}

#[tokio::test(start_paused = true)]
async fn test_filter_unwanted_removes_marked_titles() {
    let mut gateway = quick_gateway(spring_catalog());
    let tracks = vec![
        track_ref("t3", "Song (Live)", "Spring", "a1"),
        track_ref("t4", "Bloom", "Spring", "a1"),
        track_ref("t5", "Rain", "Spring (Remastered Edition)", "a1"),
    ];

    let kept = unwanted::filter_unwanted(&mut gateway, tracks).await;

    let kept_uris: Vec<&str> = kept.iter().map(|t| t.uri.as_str()).collect();
    assert_eq!(kept_uris, vec!["spotify:track:t4"]);
}

#[tokio::test(start_paused = true)]
async fn test_filter_unwanted_keeps_unverified_tracks() {
    let catalog = spring_catalog();
    catalog.fail("track:t3", server_error());
    catalog.rate_limit("track:t5", 4, Some(1));
    let mut gateway = quick_gateway(catalog);
    let tracks = vec![
        track_ref("t3", "Song (Live)", "Spring", "a1"),
        track_ref("t5", "Rain", "Spring (Remastered Edition)", "a1"),
    ];

    let kept = unwanted::filter_unwanted(&mut gateway, tracks).await;

    assert_eq!(kept.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_collect_tracks_end_to_end() {
    let mut gateway = quick_gateway(spring_catalog());
    let artists = vec![ArtistRef("a1".to_string())];

    let tracks = pipeline::collect_tracks(
        &mut gateway,
        &artists,
        &ReleaseKinds::default(),
        &march_2025(),
        None,
    )
    .await;

    // the single wins over the album's "song ", live and remastered cuts go
    let uris: Vec<&str> = tracks.iter().map(|t| t.uri.as_str()).collect();
    assert_eq!(uris, vec!["spotify:track:t1", "spotify:track:t4"]);
    assert_eq!(tracks[0].release_title, "Song");
}

#[tokio::test(start_paused = true)]
async fn test_collect_tracks_without_artists() {
    let mut gateway = quick_gateway(spring_catalog());

    let tracks = pipeline::collect_tracks(
        &mut gateway,
        &[],
        &ReleaseKinds::default(),
        &march_2025(),
        None,
    )
    .await;

    assert!(tracks.is_empty());
    assert!(gateway.catalog().calls().is_empty());
}

#[test]
fn test_normalize_title() {
    assert_eq!(normalize_title("  Song "), "song");
    assert_eq!(normalize_title("SONG"), normalize_title("song"));
    assert_ne!(normalize_title("So ng"), normalize_title("song"));
}

#[test]
fn test_dedup_key_is_per_artist() {
    let a = track_ref("t1", "Song", "Song", "a1");
    let b = track_ref("t2", "song", "Song", "a2");
    assert_ne!(dedup_key(&a), dedup_key(&b));

    let kept = dedup_tracks(vec![a, b]);
    assert_eq!(kept.len(), 2);
}

#[test]
fn test_dedup_tracks_collapses_equal_uris() {
    let kept = dedup_tracks(vec![
        track_ref("t1", "Song", "Song", "a1"),
        track_ref("t1", "Other title", "Song", "a1"),
    ]);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].title, "Song");
}

#[test]
fn test_find_marker() {
    assert_eq!(find_marker("Song (Live)"), Some("live"));
    assert_eq!(find_marker("REMIXED"), Some("remix"));
    assert_eq!(find_marker("Bloom"), None);
    // plain substring match, no word boundaries
    assert_eq!(find_marker("Alive"), Some("live"));
}

#[test]
fn test_is_unwanted_checks_both_titles() {
    assert!(is_unwanted(&track_ref("t1", "Song - Acoustic", "Spring", "a1")));
    assert!(is_unwanted(&track_ref("t1", "Song", "Spring (Deluxe Edition)", "a1")));
    assert!(!is_unwanted(&track_ref("t1", "Song", "Spring", "a1")));

    let kept = filter_unwanted_tracks(vec![
        track_ref("t1", "Song", "Spring", "a1"),
        track_ref("t2", "Song (Instrumental)", "Spring", "a1"),
    ]);
    assert_eq!(kept.len(), 1);
}

fn arbitrary_track() -> impl Strategy<Value = TrackRef> {
    (
        0..20u32,
        prop::sample::select(vec!["a1", "a2", "a3"]),
        prop::sample::select(vec!["Song", "song", " SONG ", "Bloom", "bloom ", "Rain"]),
    )
        .prop_map(|(n, artist, title)| {
            track_ref(&format!("t{}", n), title, "Release", artist)
        })
}

proptest! {
    /// No two surviving tracks share a dedup key or a URI
    #[test]
    fn dedup_leaves_unique_keys(tracks in prop::collection::vec(arbitrary_track(), 0..40)) {
        let kept = dedup_tracks(tracks);
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                prop_assert_ne!(dedup_key(a), dedup_key(b));
                prop_assert_ne!(&a.uri, &b.uri);
            }
        }
    }

    /// Deduplicating twice changes nothing
    #[test]
    fn dedup_is_idempotent(tracks in prop::collection::vec(arbitrary_track(), 0..40)) {
        let once = dedup_tracks(tracks);
        let twice = dedup_tracks(once.clone());
        prop_assert_eq!(once, twice);
    }

    /// Survivors keep their relative input order
    #[test]
    fn dedup_preserves_order(tracks in prop::collection::vec(arbitrary_track(), 0..40)) {
        let kept = dedup_tracks(tracks.clone());
        let mut rest = tracks.iter();
        for track in &kept {
            prop_assert!(rest.any(|t| t == track));
        }
    }
}
