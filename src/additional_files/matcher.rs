//! Glob pattern matching of additional files in an album source directory.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Paths, Pattern};

use crate::additional_files::config::{CategoryPatterns, Config};
use crate::additional_files::types::MatchedFile;
use crate::{path_to_string, print_warning};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Source directories that have already been scanned.
#[derive(Debug, Default, Clone)]
pub struct ScannedPaths {
    paths: HashSet<PathBuf>,
}

/// Finds files matching the configured category patterns.
#[derive(Debug, Clone, Copy)]
pub struct PatternMatcher<'a> {
    patterns: &'a [CategoryPatterns],
    media_extensions: &'a HashSet<String>,
}

/// Lazy iterator over the matches in one source directory.
///
/// Marks the directory as scanned once it has been fully consumed.
pub struct Matches<'a, 's> {
    source: PathBuf,
    escaped_source: String,
    pending: VecDeque<(&'a str, &'a str)>,
    current: Option<(&'a str, Paths)>,
    seen: HashSet<PathBuf>,
    media_extensions: &'a HashSet<String>,
    scanned: &'s mut ScannedPaths,
    finished: bool,
}

impl ScannedPaths {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Returns true if the path was not already present.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.paths.insert(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<'a> PatternMatcher<'a> {
    #[must_use]
    pub const fn new(patterns: &'a [CategoryPatterns], media_extensions: &'a HashSet<String>) -> Self {
        Self {
            patterns,
            media_extensions,
        }
    }

    #[must_use]
    pub fn from_config(config: &'a Config) -> Self {
        Self::new(&config.patterns, &config.media_extensions)
    }

    /// Enumerate files and directories under `source` matched by the category patterns.
    ///
    /// Yields nothing if `source` is already in `scanned`.
    /// Each path is yielded once, with the first category that matched it.
    pub fn match_patterns<'s>(&self, source: &Path, scanned: &'s mut ScannedPaths) -> Matches<'a, 's> {
        let finished = scanned.contains(source);
        let pending = if finished {
            VecDeque::new()
        } else {
            self.patterns
                .iter()
                .flat_map(|category| {
                    category
                        .patterns
                        .iter()
                        .map(move |pattern| (category.category.as_str(), pattern.as_str()))
                })
                .collect()
        };

        Matches {
            source: source.to_path_buf(),
            escaped_source: Pattern::escape(&path_to_string(source)),
            pending,
            current: None,
            seen: HashSet::new(),
            media_extensions: self.media_extensions,
            scanned,
            finished,
        }
    }
}

impl Matches<'_, '_> {
    fn start_next_pattern(&mut self) -> bool {
        while let Some((category, pattern)) = self.pending.pop_front() {
            let full_pattern = Path::new(&self.escaped_source).join(pattern);
            match glob::glob_with(&path_to_string(&full_pattern), MATCH_OPTIONS) {
                Ok(paths) => {
                    self.current = Some((category, paths));
                    return true;
                }
                Err(error) => print_warning!("Invalid pattern '{pattern}' for category '{category}': {error}"),
            }
        }
        false
    }

    fn finish(&mut self) {
        self.finished = true;
        self.current = None;
        self.scanned.insert(self.source.clone());
    }
}

impl Iterator for Matches<'_, '_> {
    type Item = MatchedFile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            if let Some((category, paths)) = self.current.as_mut() {
                for entry in paths.by_ref() {
                    match entry {
                        Ok(path) => {
                            if is_excluded(&path, self.media_extensions) || !self.seen.insert(path.clone()) {
                                continue;
                            }
                            return Some(MatchedFile {
                                path,
                                category: (*category).to_string(),
                            });
                        }
                        Err(error) => print_warning!("Skipping unreadable path: {error}"),
                    }
                }
                self.current = None;
            }

            if !self.start_next_pattern() {
                self.finish();
                return None;
            }
        }
    }
}

/// Special directory entries and media files owned by the importer are never matched.
fn is_excluded(path: &Path, media_extensions: &HashSet<String>) -> bool {
    // `Path::file_name` normalizes away a trailing `.`, so look at the raw string
    let raw = path_to_string(path);
    let basename = raw.rsplit(std::path::is_separator).next().unwrap_or_default();
    if basename == "." || basename == ".." {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| !ext.is_empty() && media_extensions.contains(ext))
}

#[cfg(test)]
mod matcher_tests {
    use super::*;

    use std::fs::{self, File};

    use tempfile::tempdir;

    use crate::additional_files::config::DEFAULT_MEDIA_EXTENSIONS;

    fn category(name: &str, patterns: &[&str]) -> CategoryPatterns {
        CategoryPatterns {
            category: name.to_string(),
            patterns: patterns.iter().map(ToString::to_string).collect(),
        }
    }

    fn media_extensions() -> HashSet<String> {
        DEFAULT_MEDIA_EXTENSIONS.iter().map(ToString::to_string).collect()
    }

    fn album_dir() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        for name in ["file.mp3", "file.cue", "file.txt", "file.log", ".hidden.log", "upper.MP3"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("scans")).unwrap();
        File::create(dir.path().join("scans/front.jpg")).unwrap();
        fs::create_dir(dir.path().join("CD1")).unwrap();
        File::create(dir.path().join("CD1/disc.cue")).unwrap();
        dir
    }

    fn collect(matcher: PatternMatcher<'_>, source: &Path, scanned: &mut ScannedPaths) -> Vec<(PathBuf, String)> {
        matcher
            .match_patterns(source, scanned)
            .map(|m| (m.path, m.category))
            .collect()
    }

    #[test]
    fn matches_files_and_directories() {
        let dir = album_dir();
        let patterns = vec![
            category("log", &["*.log"]),
            category("cue", &["*.cue", "*/*.cue"]),
            category("artwork", &["scans/"]),
        ];
        let extensions = media_extensions();
        let matcher = PatternMatcher::new(&patterns, &extensions);
        let mut scanned = ScannedPaths::new();

        let matches = collect(matcher, dir.path(), &mut scanned);

        assert!(matches.contains(&(dir.path().join("file.log"), "log".to_string())));
        assert!(matches.contains(&(dir.path().join("file.cue"), "cue".to_string())));
        assert!(matches.contains(&(dir.path().join("CD1/disc.cue"), "cue".to_string())));
        assert!(matches.contains(&(dir.path().join("scans"), "artwork".to_string())));
        assert_eq!(matches.len(), 4);
    }

    #[test]
    fn wildcards_do_not_match_hidden_files() {
        let dir = album_dir();
        let patterns = vec![category("log", &["*.log"])];
        let extensions = media_extensions();
        let matcher = PatternMatcher::new(&patterns, &extensions);

        let matches = collect(matcher, dir.path(), &mut ScannedPaths::new());
        assert_eq!(matches, vec![(dir.path().join("file.log"), "log".to_string())]);
    }

    #[test]
    fn media_files_are_never_matched() {
        let dir = album_dir();
        let patterns = vec![category("everything", &["*"])];
        let extensions = media_extensions();
        let matcher = PatternMatcher::new(&patterns, &extensions);

        let matches = collect(matcher, dir.path(), &mut ScannedPaths::new());
        let paths: Vec<_> = matches.iter().map(|(path, _)| path.clone()).collect();

        assert!(!paths.contains(&dir.path().join("file.mp3")));
        // Extension comparison is case-sensitive
        assert!(paths.contains(&dir.path().join("upper.MP3")));
        assert!(paths.contains(&dir.path().join("file.txt")));
    }

    #[test]
    fn second_scan_of_same_directory_is_empty() {
        let dir = album_dir();
        let patterns = vec![category("log", &["*.log"])];
        let extensions = media_extensions();
        let matcher = PatternMatcher::new(&patterns, &extensions);
        let mut scanned = ScannedPaths::new();

        assert_eq!(collect(matcher, dir.path(), &mut scanned).len(), 1);
        assert!(scanned.contains(dir.path()));
        assert!(collect(matcher, dir.path(), &mut scanned).is_empty());
    }

    #[test]
    fn directory_is_marked_scanned_only_after_exhaustion() {
        let dir = album_dir();
        let patterns = vec![category("cue", &["*.cue", "*/*.cue"])];
        let extensions = media_extensions();
        let matcher = PatternMatcher::new(&patterns, &extensions);
        let mut scanned = ScannedPaths::new();

        {
            let mut matches = matcher.match_patterns(dir.path(), &mut scanned);
            assert!(matches.next().is_some());
        }
        assert!(scanned.is_empty());

        let count = matcher.match_patterns(dir.path(), &mut scanned).count();
        assert_eq!(count, 2);
        assert_eq!(scanned.len(), 1);
    }

    #[test]
    fn overlapping_categories_yield_first_category_only() {
        let dir = album_dir();
        let patterns = vec![category("cue", &["*.cue"]), category("text", &["file.*"])];
        let extensions = media_extensions();
        let matcher = PatternMatcher::new(&patterns, &extensions);

        let matches = collect(matcher, dir.path(), &mut ScannedPaths::new());
        let cue_matches: Vec<_> = matches
            .iter()
            .filter(|(path, _)| path == &dir.path().join("file.cue"))
            .collect();
        assert_eq!(cue_matches.len(), 1);
        assert_eq!(cue_matches[0].1, "cue");
        assert!(matches.contains(&(dir.path().join("file.log"), "text".to_string())));
    }

    #[test]
    fn source_with_glob_characters_is_escaped() {
        let root = tempdir().unwrap();
        let source = root.path().join("Album [Deluxe]");
        fs::create_dir(&source).unwrap();
        File::create(source.join("rip.log")).unwrap();

        let patterns = vec![category("log", &["*.log"])];
        let extensions = media_extensions();
        let matcher = PatternMatcher::new(&patterns, &extensions);

        let matches = collect(matcher, &source, &mut ScannedPaths::new());
        assert_eq!(matches, vec![(source.join("rip.log"), "log".to_string())]);
    }

    #[test]
    fn no_patterns_yields_nothing_but_marks_scanned() {
        let dir = album_dir();
        let extensions = media_extensions();
        let matcher = PatternMatcher::new(&[], &extensions);
        let mut scanned = ScannedPaths::new();
        assert!(collect(matcher, dir.path(), &mut scanned).is_empty());
        assert!(scanned.contains(dir.path()));
    }

    #[test]
    fn excluded_special_entries() {
        let extensions = media_extensions();
        assert!(is_excluded(Path::new("/src/album/."), &extensions));
        assert!(is_excluded(Path::new("/src/album/.."), &extensions));
        assert!(is_excluded(Path::new("/src/album/track.flac"), &extensions));
        assert!(!is_excluded(Path::new("/src/album/notes.txt"), &extensions));
        assert!(!is_excluded(Path::new("/src/album/README"), &extensions));
    }
}
