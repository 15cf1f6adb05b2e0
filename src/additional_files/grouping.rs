//! Grouping of track operations into album level operations.

use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use itertools::Itertools;

use crate::additional_files::types::{MediaItem, TrackOperation};
use crate::path_to_string;

/// Album grouping key: (album artist or artist, album).
pub type GroupKey = (String, String);

/// Track operations of one album with their common source and destination directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationGroup {
    pub key: GroupKey,
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
    /// Metadata source for the whole album.
    pub item: MediaItem,
    pub track_count: usize,
}

#[must_use]
pub fn group_key(item: &MediaItem) -> GroupKey {
    (
        item.album_artist_or_artist().to_string(),
        item.album.clone().unwrap_or_default(),
    )
}

/// Group operations by album.
///
/// Operations sharing a key form one group regardless of their directories,
/// so multi-disc albums collapse into their shared parent directory.
/// A group whose paths have no common ancestor is returned as an error.
pub fn group_operations<'a>(operations: impl IntoIterator<Item = &'a TrackOperation>) -> Vec<Result<OperationGroup>> {
    let sorted = operations
        .into_iter()
        .map(|operation| (group_key(&operation.item), operation))
        .sorted_by(|(key_a, op_a), (key_b, op_b)| {
            key_a
                .cmp(key_b)
                .then_with(|| op_a.source.cmp(&op_b.source))
                .then_with(|| op_a.destination.cmp(&op_b.destination))
        });

    let chunks = sorted.chunk_by(|(key, _)| key.clone());
    chunks
        .into_iter()
        .map(|(key, chunk)| {
            let members: Vec<&TrackOperation> = chunk.map(|(_, operation)| operation).collect();
            build_group(key, &members)
        })
        .collect()
}

fn build_group(key: GroupKey, members: &[&TrackOperation]) -> Result<OperationGroup> {
    let Some(first) = members.first() else {
        anyhow::bail!("Empty album group: {} - {}", key.0, key.1);
    };

    let source_dir = common_path(members.iter().map(|op| parent_dir(&op.source)))
        .map_err(|error| anyhow::anyhow!("Album '{} - {}' source directories: {error}", key.0, key.1))?;
    let destination_dir = common_path(members.iter().map(|op| parent_dir(&op.destination)))
        .map_err(|error| anyhow::anyhow!("Album '{} - {}' destination directories: {error}", key.0, key.1))?;

    Ok(OperationGroup {
        item: first.item.clone(),
        track_count: members.len(),
        key,
        source_dir,
        destination_dir,
    })
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}

/// Longest common path prefix, compared by whole components.
///
/// Fails for an empty input, for a mix of absolute and relative paths,
/// and for absolute paths that do not share a root.
pub fn common_path<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Result<PathBuf> {
    let mut paths = paths.into_iter();
    let Some(first) = paths.next() else {
        anyhow::bail!("no paths to compare");
    };

    let absolute = first.has_root();
    let mut common: Vec<Component> = first.components().collect();

    for path in paths {
        if path.has_root() != absolute {
            anyhow::bail!("cannot mix absolute and relative paths: {}", path_to_string(path));
        }
        let shared = common
            .iter()
            .zip(path.components())
            .take_while(|(a, b)| *a == b)
            .count();
        common.truncate(shared);
    }

    if absolute && common.is_empty() {
        anyhow::bail!("paths do not share a common root");
    }

    Ok(common.iter().collect())
}

#[cfg(test)]
mod grouping_tests {
    use super::*;

    fn item(artist: &str, album_artist: Option<&str>, album: &str) -> MediaItem {
        MediaItem::new(Some(artist), album_artist, Some(album))
    }

    fn groups(operations: &[TrackOperation]) -> Vec<OperationGroup> {
        group_operations(operations).into_iter().map(Result::unwrap).collect()
    }

    #[test]
    fn common_path_of_siblings() {
        let paths = [Path::new("/src/album/CD1"), Path::new("/src/album/CD2")];
        assert_eq!(common_path(paths).unwrap(), PathBuf::from("/src/album"));
    }

    #[test]
    fn common_path_compares_whole_components() {
        let paths = [Path::new("/music/abc"), Path::new("/music/abd")];
        assert_eq!(common_path(paths).unwrap(), PathBuf::from("/music"));
    }

    #[test]
    fn common_path_of_single_path() {
        assert_eq!(
            common_path([Path::new("/src/album")]).unwrap(),
            PathBuf::from("/src/album")
        );
    }

    #[test]
    fn common_path_of_unrelated_absolute_paths_is_root() {
        let paths = [Path::new("/a/b"), Path::new("/c/d")];
        assert_eq!(common_path(paths).unwrap(), PathBuf::from("/"));
    }

    #[test]
    fn common_path_errors() {
        assert!(common_path(std::iter::empty::<&Path>()).is_err());
        assert!(common_path([Path::new("/a/b"), Path::new("a/b")]).is_err());
    }

    #[test]
    fn tracks_of_one_album_form_one_group() {
        let album = item("Artist", None, "Album");
        let operations = vec![
            TrackOperation::new(album.clone(), "/src/album/01.mp3", "/dst/Artist/Album/01.mp3"),
            TrackOperation::new(album.clone(), "/src/album/02.mp3", "/dst/Artist/Album/02.mp3"),
            TrackOperation::new(album, "/src/album/03.mp3", "/dst/Artist/Album/03.mp3"),
        ];

        let groups = groups(&operations);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, ("Artist".to_string(), "Album".to_string()));
        assert_eq!(groups[0].source_dir, PathBuf::from("/src/album"));
        assert_eq!(groups[0].destination_dir, PathBuf::from("/dst/Artist/Album"));
        assert_eq!(groups[0].track_count, 3);
        for operation in &operations {
            assert!(operation.source.starts_with(&groups[0].source_dir));
            assert!(operation.destination.starts_with(&groups[0].destination_dir));
        }
    }

    #[test]
    fn multi_disc_album_collapses_to_parent() {
        let album = item("Artist", None, "Album");
        let operations = vec![
            TrackOperation::new(album.clone(), "/src/album/CD1/file.mp3", "/dst/01.mp3"),
            TrackOperation::new(album, "/src/album/CD2/file.mp3", "/dst/02.mp3"),
        ];

        let groups = groups(&operations);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].source_dir, PathBuf::from("/src/album"));
        assert_eq!(groups[0].destination_dir, PathBuf::from("/dst"));
    }

    #[test]
    fn album_artist_takes_precedence_over_artist() {
        let operations = vec![
            TrackOperation::new(item("One", Some("Various"), "Hits"), "/src/hits/1.mp3", "/dst/hits/1.mp3"),
            TrackOperation::new(item("Two", Some("Various"), "Hits"), "/src/hits/2.mp3", "/dst/hits/2.mp3"),
            TrackOperation::new(item("Two", Some(""), "Hits"), "/src/two/1.mp3", "/dst/two/1.mp3"),
        ];

        let groups = groups(&operations);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, ("Two".to_string(), "Hits".to_string()));
        assert_eq!(groups[0].source_dir, PathBuf::from("/src/two"));
        assert_eq!(groups[1].key, ("Various".to_string(), "Hits".to_string()));
        assert_eq!(groups[1].track_count, 2);
    }

    #[test]
    fn separate_albums_form_separate_groups() {
        let operations = vec![
            TrackOperation::new(item("A", None, "album2"), "/src/album2/1.mp3", "/dst/album2/1.mp3"),
            TrackOperation::new(item("A", None, "album1"), "/src/album1/1.mp3", "/dst/album1/1.mp3"),
            TrackOperation::new(item("A", None, "album1"), "/src/album1/2.mp3", "/dst/album1/2.mp3"),
        ];

        let groups = groups(&operations);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].source_dir, PathBuf::from("/src/album1"));
        assert_eq!(groups[1].source_dir, PathBuf::from("/src/album2"));
    }

    #[test]
    fn group_without_common_root_is_an_error() {
        let album = item("A", None, "B");
        let operations = vec![
            TrackOperation::new(album.clone(), "/src/b/1.mp3", "/dst/b/1.mp3"),
            TrackOperation::new(album, "relative/b/2.mp3", "/dst/b/2.mp3"),
            TrackOperation::new(item("C", None, "D"), "/src/d/1.mp3", "/dst/d/1.mp3"),
        ];

        let results = group_operations(&operations);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }

    #[test]
    fn no_operations_no_groups() {
        assert!(group_operations(std::iter::empty::<&TrackOperation>()).is_empty());
    }
}
