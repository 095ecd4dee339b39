use std::{collections::HashMap, path::PathBuf};

use tabled::Table;

use super::{connect, load_artists};
use crate::{
    error,
    spotify::{gateway::Outcome, ops::SeveralArtists},
    types::{Artist, ArtistTableRow},
    warning,
};

const ARTIST_BATCH_SIZE: usize = 50;

/// Lists the curated artists with the name and genres the catalog has for
/// them. Ids the catalog does not know are shown with a `?` name.
pub async fn artists(artists_file: Option<PathBuf>, search: Option<String>) {
    let (source, artists) = match load_artists(artists_file).await {
        Ok(found) => found,
        Err(e) => error!("Cannot fetch artists: {}", e),
    };

    if artists.is_empty() {
        error!("No artists found in {}.", source);
    }

    let mut gateway = match connect().await {
        Ok(gateway) => gateway,
        Err(e) => error!("{}", e),
    };

    let ids: Vec<String> = artists.iter().map(|a| a.id().to_string()).collect();
    let mut known: HashMap<String, Artist> = HashMap::new();

    for batch in ids.chunks(ARTIST_BATCH_SIZE) {
        match gateway.send(&SeveralArtists { ids: batch }).await {
            Ok(Outcome::Done(found)) => {
                known.extend(found.into_iter().map(|a| (a.id.clone(), a)));
            }
            Ok(Outcome::Exhausted { .. }) => {
                warning!("Skipping {} artists after repeated rate limiting.", batch.len())
            }
            Err(e) => warning!("Failed to resolve artists: {}", e),
        }
    }

    let search_term = search.map(|s| s.to_lowercase());

    let rows: Vec<ArtistTableRow> = ids
        .into_iter()
        .map(|id| match known.remove(&id) {
            Some(artist) => ArtistTableRow {
                name: artist.name,
                genres: artist
                    .genres
                    .iter()
                    .take(3)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(","),
                id,
            },
            None => ArtistTableRow {
                name: "?".to_string(),
                genres: String::new(),
                id,
            },
        })
        .filter(|row| {
            search_term
                .as_ref()
                .is_none_or(|term| row.name.to_lowercase().contains(term))
        })
        .collect();

    let count = rows.len();
    println!("{} artists from {}\n{}", count, source, Table::new(rows));
}
