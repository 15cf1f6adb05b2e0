use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use extra_files::additional_files::{MediaItem, OperationKind, Session};

/// Track operations reported by the importer for one session.
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub copied: Vec<ManifestEntry>,
    #[serde(default)]
    pub moved: Vec<ManifestEntry>,
}

/// One copied or moved track.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    #[serde(flatten)]
    pub item: MediaItem,
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl Manifest {
    /// Read a manifest from the given file, or from stdin if no file is given.
    ///
    /// # Errors
    /// Returns an error if the input cannot be read or is not a valid manifest.
    pub fn read(path: Option<&Path>) -> Result<Self> {
        let content = if let Some(path) = path {
            fs::read_to_string(path).with_context(|| format!("Failed to read manifest: {}", path.display()))?
        } else {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read manifest from stdin")?;
            content
        };
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse manifest JSON")
    }

    /// Record every entry into the session. Returns the number of distinct operations recorded.
    pub fn record_into(self, session: &mut Session<'_>) -> usize {
        let copies = self.copied.into_iter().map(|entry| (OperationKind::Copy, entry));
        let moves = self.moved.into_iter().map(|entry| (OperationKind::Move, entry));
        copies
            .chain(moves)
            .filter(|(kind, entry)| {
                session.record(*kind, entry.item.clone(), entry.source.clone(), entry.destination.clone())
            })
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.copied.len() + self.moved.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.copied.is_empty() && self.moved.is_empty()
    }
}

#[cfg(test)]
mod manifest_tests {
    use super::*;

    use extra_files::additional_files::Config;

    const MANIFEST: &str = r#"
{
    "copied": [
        {"artist": "Artist", "album": "Album", "source": "/src/01.mp3", "destination": "/dst/01.mp3"}
    ],
    "moved": [
        {"artist": "One", "albumartist": "Various", "album": "Hits", "source": "/src/a.mp3", "destination": "/dst/a.mp3"},
        {"artist": "One", "albumartist": "Various", "album": "Hits", "source": "/src/a.mp3", "destination": "/dst/a.mp3"},
        {"source": "/src/b.mp3", "destination": "/dst/b.mp3"}
    ]
}
"#;

    #[test]
    fn parses_entries_with_optional_metadata() {
        let manifest = Manifest::from_json_str(MANIFEST).unwrap();
        assert_eq!(manifest.len(), 4);
        assert_eq!(manifest.copied[0].item.artist.as_deref(), Some("Artist"));
        assert_eq!(manifest.copied[0].item.album_artist, None);
        assert_eq!(manifest.moved[0].item.album_artist.as_deref(), Some("Various"));
        assert_eq!(manifest.moved[2].item, MediaItem::default());
        assert_eq!(manifest.moved[2].source, PathBuf::from("/src/b.mp3"));
    }

    #[test]
    fn missing_sections_are_empty() {
        let manifest = Manifest::from_json_str("{}").unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn entry_without_paths_is_an_error() {
        assert!(Manifest::from_json_str(r#"{"moved": [{"artist": "A"}]}"#).is_err());
    }

    #[test]
    fn duplicates_are_recorded_once() {
        let config = Config::default();
        let mut session = Session::new(&config);
        let recorded = Manifest::from_json_str(MANIFEST).unwrap().record_into(&mut session);
        assert_eq!(recorded, 3);
        assert_eq!(session.len(), 3);
    }
}
