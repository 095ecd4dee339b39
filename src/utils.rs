use std::{collections::BTreeSet, fmt};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Release categories harvested per artist.
///
/// Variant order is harvest order: singles are collected before albums, which
/// decides who wins when two entries collapse during deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReleaseKind {
    Single,
    Album,
}

impl ReleaseKind {
    pub const ALL: [ReleaseKind; 2] = [ReleaseKind::Single, ReleaseKind::Album];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseKind::Single => "single",
            ReleaseKind::Album => "album",
        }
    }
}

impl fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseKinds(pub BTreeSet<ReleaseKind>);

impl ReleaseKinds {
    pub fn iter(&self) -> impl Iterator<Item = ReleaseKind> + '_ {
        self.0.iter().copied()
    }
}

impl Default for ReleaseKinds {
    fn default() -> Self {
        ReleaseKinds(ReleaseKind::ALL.into_iter().collect())
    }
}

impl fmt::Display for ReleaseKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ReleaseKind::as_str)
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

/// Parses a comma separated list of release kinds, e.g. `single,album` or `all`.
pub fn parse_release_kinds(input: &str) -> Result<ReleaseKinds, String> {
    if input.trim().is_empty() {
        return Err("release types cannot be empty".to_string());
    }

    let mut kinds = BTreeSet::new();
    for segment in input.split(',') {
        let segment = segment.trim().to_lowercase();
        match segment.as_str() {
            "" => return Err(format!("empty segment in '{}'", input)),
            "all" => kinds.extend(ReleaseKind::ALL),
            "single" | "singles" => {
                kinds.insert(ReleaseKind::Single);
            }
            "album" | "albums" => {
                kinds.insert(ReleaseKind::Album);
            }
            other => {
                return Err(format!(
                    "invalid value '{}' (expected single, album or all)",
                    other
                ));
            }
        }
    }

    Ok(ReleaseKinds(kinds))
}

/// Extracts the bare Spotify artist id from the forms an artist list may hold:
/// `spotify:artist:<id>`, `https://open.spotify.com/artist/<id>?si=...` or the
/// bare id itself.
pub fn parse_artist_reference(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let id = if let Some(rest) = raw.strip_prefix("spotify:artist:") {
        rest
    } else if let Some(pos) = raw.find("/artist/") {
        let rest = &raw[pos + "/artist/".len()..];
        rest.split(['?', '/', '#']).next().unwrap_or_default()
    } else if raw.contains(':') || raw.contains('/') {
        return None;
    } else {
        raw
    };

    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(id.to_string())
    } else {
        None
    }
}

/// Returns the id part of a `spotify:track:<id>` URI. Bare ids pass through.
pub fn track_id_from_uri(uri: &str) -> &str {
    uri.rsplit(':').next().unwrap_or(uri)
}
