use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::path_to_string;

/// Placeholder used in templates for missing metadata.
pub const MISSING_VALUE: &str = "None";

/// Host metadata for one tracked media file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct MediaItem {
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default, rename = "albumartist")]
    pub album_artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
}

/// One track move or copy event reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackOperation {
    pub(crate) item: MediaItem,
    pub(crate) source: PathBuf,
    pub(crate) destination: PathBuf,
}

/// Whether tracks, and their additional files, were copied or moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Copy,
    Move,
}

/// A file or directory found next to the tracks of an album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFile {
    /// Absolute path of the match.
    pub path: PathBuf,
    /// Configuration key whose pattern matched.
    pub category: String,
}

/// Album level values available to destination templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumMetadata {
    pub artist: String,
    pub album_artist: String,
    pub album: String,
    pub album_path: PathBuf,
}

/// A planned copy or move of one additional file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Outcome counts for one session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub copied: usize,
    pub moved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failed_groups: usize,
}

impl MediaItem {
    #[must_use]
    pub fn new(artist: Option<&str>, album_artist: Option<&str>, album: Option<&str>) -> Self {
        Self {
            artist: artist.map(ToString::to_string),
            album_artist: album_artist.map(ToString::to_string),
            album: album.map(ToString::to_string),
        }
    }

    /// Album artist if set and non-empty, otherwise the track artist.
    #[must_use]
    pub fn album_artist_or_artist(&self) -> &str {
        self.album_artist
            .as_deref()
            .filter(|value| !value.is_empty())
            .or(self.artist.as_deref())
            .unwrap_or_default()
    }
}

impl TrackOperation {
    #[must_use]
    pub fn new(item: MediaItem, source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            item,
            source: source.into(),
            destination: destination.into(),
        }
    }

    #[must_use]
    pub const fn item(&self) -> &MediaItem {
        &self.item
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

impl OperationKind {
    /// Present participle used in console output, for example "Copying".
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Copy => "Copying",
            Self::Move => "Moving",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::Move => write!(f, "move"),
        }
    }
}

impl AlbumMetadata {
    /// Build template metadata from a representative track and the album destination directory.
    /// Missing or empty values become `"None"`.
    #[must_use]
    pub fn new(item: &MediaItem, album_path: &Path) -> Self {
        let or_missing = |value: Option<&String>| {
            value
                .filter(|v| !v.is_empty())
                .map_or_else(|| MISSING_VALUE.to_string(), Clone::clone)
        };
        Self {
            artist: or_missing(item.artist.as_ref()),
            album_artist: or_missing(item.album_artist.as_ref()),
            album: or_missing(item.album.as_ref()),
            album_path: album_path.to_path_buf(),
        }
    }
}

impl Transfer {
    #[must_use]
    pub const fn new(source: PathBuf, destination: PathBuf) -> Self {
        Self { source, destination }
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", path_to_string(&self.source), path_to_string(&self.destination))
    }
}

impl SessionReport {
    /// Number of transfers that completed.
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.copied + self.moved
    }

    /// True if any transfer or group failed.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.failed > 0 || self.failed_groups > 0
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "copied: {}, moved: {}, skipped: {}, failed: {}",
            self.copied, self.moved, self.skipped, self.failed
        )?;
        if self.failed_groups > 0 {
            write!(f, ", failed albums: {}", self.failed_groups)?;
        }
        Ok(())
    }
}
