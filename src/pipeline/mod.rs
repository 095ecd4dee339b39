//! Track discovery and filtering.
//!
//! Given the curated artists, [`collect_tracks`] produces the deduplicated,
//! content-filtered tracks released during the previous calendar month:
//!
//! 1. [`harvest`] each release kind over all artists (singles first)
//! 2. concatenate the per-kind results
//! 3. [`dedup`] by primary artist and normalized title
//! 4. [`unwanted`] drops alternate versions and re-releases
//!
//! Everything runs sequentially against the rate-limited gateway.

pub mod dedup;
pub mod harvest;
pub mod unwanted;
pub mod window;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    info,
    spotify::{
        catalog::Catalog,
        gateway::{CredentialStore, Gateway},
    },
    success,
    types::{ArtistRef, TrackRef},
    utils::ReleaseKinds,
};
pub use window::ReleaseWindow;

pub(crate) fn progress_bar(len: u64, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {prefix} [{bar:30.blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_prefix(message);
    pb
}

/// Runs the whole discovery stage for one release window.
///
/// # Arguments
///
/// * `gateway` - Gateway shared by every stage
/// * `artists` - Curated artists in source order
/// * `kinds` - Release kinds to harvest, singles before albums
/// * `window` - Month whose releases are collected
/// * `artist_timeout` - Optional limit for the harvest of a single artist
///
/// # Returns
///
/// The surviving tracks in harvest order. Never fails: problems with single
/// artists, releases or tracks are reported and skipped.
pub async fn collect_tracks<C: Catalog, S: CredentialStore>(
    gateway: &mut Gateway<C, S>,
    artists: &[ArtistRef],
    kinds: &ReleaseKinds,
    window: &ReleaseWindow,
    artist_timeout: Option<Duration>,
) -> Vec<TrackRef> {
    let mut merged: Vec<String> = Vec::new();

    for kind in kinds.iter() {
        info!(
            "Fetching {} releases of {} artists between {} and {}...",
            kind,
            artists.len(),
            window.start().format("%Y-%m-%d"),
            window.end().format("%Y-%m-%d")
        );
        let uris = harvest::harvest(gateway, artists, kind, window, artist_timeout).await;
        success!("Found {} tracks on {} releases.", uris.len(), kind);
        merged.extend(uris);
    }

    info!("Checking {} tracks for duplicates...", merged.len());
    let unique = dedup::dedup(gateway, merged).await;

    info!("Checking {} tracks for unwanted versions...", unique.len());
    let wanted = unwanted::filter_unwanted(gateway, unique).await;

    success!("{} tracks left after filtering.", wanted.len());
    wanted
}
