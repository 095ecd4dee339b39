use std::path::PathBuf;

use chrono::Utc;
use tabled::Table;

use super::{connect, load_artists};
use crate::{
    config, error, info,
    pipeline::{self, ReleaseWindow},
    spotify::playlist,
    success,
    types::TrackTableRow,
    utils::ReleaseKinds,
};

/// Builds (or extends) the playlist named after last month from the curated
/// artists' releases of that month.
pub async fn update(artists_file: Option<PathBuf>, kinds: &ReleaseKinds, dry_run: bool) {
    let source_hint = if artists_file.is_some() {
        "artist file"
    } else {
        "Notion"
    };
    info!("Fetching artists from {}...", source_hint);

    let (source, artists) = match load_artists(artists_file).await {
        Ok(found) => found,
        Err(e) => error!("Cannot fetch artists from {}: {}", source_hint, e),
    };

    if artists.is_empty() {
        error!("No artists found in {}.", source);
    }
    success!("Found {} artists in {}.", artists.len(), source);

    let artist_timeout = match config::artist_timeout() {
        Ok(limit) => limit,
        Err(e) => error!("{}", e),
    };
    let public = match config::playlist_public() {
        Ok(public) => public,
        Err(e) => error!("{}", e),
    };

    info!("Initializing Spotify API...");
    let mut gateway = match connect().await {
        Ok(gateway) => gateway,
        Err(e) => error!("{}", e),
    };

    // captured once so the window cannot drift during a long run
    let window = ReleaseWindow::previous_month(Utc::now().date_naive());

    info!("Fetching recent tracks for artists...");
    let tracks =
        pipeline::collect_tracks(&mut gateway, &artists, kinds, &window, artist_timeout).await;

    if tracks.is_empty() {
        error!("No recent tracks found for the artists.");
    }

    let playlist_name = window.label();

    if dry_run {
        let rows: Vec<TrackTableRow> = tracks
            .into_iter()
            .map(|t| TrackTableRow {
                title: t.title,
                release: t.release_title,
                uri: t.uri,
            })
            .collect();
        println!("Playlist: {}\n{}", playlist_name, Table::new(rows));
        success!("Dry run finished, playlist left untouched.");
        return;
    }

    let uris: Vec<String> = tracks.into_iter().map(|t| t.uri).collect();

    info!("Creating or updating playlist: {}...", playlist_name);
    match playlist::create_or_update(&mut gateway, &playlist_name, &uris, public).await {
        Ok(update) => {
            if update.created {
                success!("Playlist {} created.", playlist_name);
            }
            success!(
                "Playlist updated successfully! Added {} tracks. Playlist ID: {}",
                update.tracks_added,
                update.playlist_id
            );
        }
        Err(e) => error!("Error: {}", e),
    }
}
