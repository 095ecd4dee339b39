use std::path::PathBuf;

use super::{ArtistSource, SourceError, collect_artists};
use crate::types::ArtistRef;

/// Reads one artist reference per line. Blank lines and lines starting with
/// `#` are ignored.
pub struct FileArtistSource {
    path: PathBuf,
}

impl FileArtistSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ArtistSource for FileArtistSource {
    fn name(&self) -> &str {
        "artist file"
    }

    async fn list_artists(&self) -> Result<Vec<ArtistRef>, SourceError> {
        let content = async_fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::File {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        let lines = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect::<Vec<_>>();

        Ok(collect_artists(lines))
    }
}
