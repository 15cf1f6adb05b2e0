//! Filesystem helpers: filename sanitizing, unique paths, directory creation, copy and move.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use walkdir::WalkDir;

use crate::{insert_suffix_before_extension, path_to_file_stem_string, path_to_string};

/// Replacements applied to a destination filename, in order.
const DEFAULT_REPLACEMENTS: &[(&str, &str)] = &[
    (r"[\\/]", "_"),
    (r"^\.", "_"),
    (r"[\x00-\x1f]", ""),
    (r#"[<>:"\?\*\|]"#, "_"),
    (r"\.$", "_"),
    (r"\s+$", ""),
];

static DEFAULT_SANITIZE_RULES: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    DEFAULT_REPLACEMENTS
        .iter()
        .map(|(pattern, replacement)| {
            (
                Regex::new(pattern).expect("Invalid sanitize regex"),
                (*replacement).to_string(),
            )
        })
        .collect()
});

/// Regex to match a numeric disambiguation suffix like `.2` at the end of a file stem.
static RE_UNIQUE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(\d+)$").expect("Invalid unique suffix regex"));

/// Removes characters that are invalid in filenames.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    rules: Vec<(Regex, String)>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self {
            rules: DEFAULT_SANITIZE_RULES.clone(),
        }
    }
}

impl Sanitizer {
    /// Create a sanitizer from custom regex replacement pairs.
    ///
    /// # Errors
    /// Returns an error if a pattern is not a valid regex.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self> {
        let rules = pairs
            .iter()
            .map(|(pattern, replacement)| {
                Regex::new(pattern)
                    .map(|regex| (regex, replacement.clone()))
                    .with_context(|| format!("Invalid replace regex: '{pattern}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Apply all replacement rules to a single path component.
    #[must_use]
    pub fn sanitize(&self, name: &str) -> String {
        self.rules.iter().fold(name.to_string(), |acc, (regex, replacement)| {
            regex.replace_all(&acc, replacement.as_str()).into_owned()
        })
    }

    /// Number of replacement rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Return a path that does not exist yet.
///
/// If `path` exists, a numeric suffix is inserted before the extension: `name.1.ext`, `name.2.ext`...
/// An existing numeric suffix is continued instead of stacked.
#[must_use]
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path_to_file_stem_string(path);
    let (base_stem, mut number) = RE_UNIQUE_SUFFIX.captures(&stem).map_or_else(
        || (stem.clone(), 0_u64),
        |captures| {
            let number = captures[1].parse::<u64>().unwrap_or(0);
            (stem[..captures.get(0).map_or(stem.len(), |m| m.start())].to_string(), number)
        },
    );

    let base = path.with_file_name(path.extension().map_or_else(
        || base_stem.clone(),
        |extension| format!("{base_stem}.{}", extension.to_string_lossy()),
    ));

    loop {
        number += 1;
        let candidate = insert_suffix_before_extension(&base, &format!(".{number}"));
        if !candidate.exists() {
            return candidate;
        }
    }
}

/// Create all missing ancestor directories of the given path.
pub fn create_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Copy a file, failing if the target already exists.
pub fn copy_file(source: &Path, target: &Path) -> Result<()> {
    if target.exists() {
        anyhow::bail!("File exists: {}", path_to_string(target));
    }
    fs::copy(source, target)
        .with_context(|| format!("Failed to copy {} -> {}", source.display(), target.display()))?;
    Ok(())
}

/// Recursively copy a directory and its contents, failing if the target already exists.
pub fn copy_dir_recursive(source: &Path, target: &Path) -> Result<()> {
    if target.exists() {
        anyhow::bail!("Directory exists: {}", path_to_string(target));
    }

    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to read directory: {}", source.display()))?;
        let relative = entry.path().strip_prefix(source)?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)
                .with_context(|| format!("Failed to create directory: {}", destination.display()))?;
        } else {
            fs::copy(entry.path(), &destination).with_context(|| {
                format!("Failed to copy {} -> {}", entry.path().display(), destination.display())
            })?;
        }
    }

    Ok(())
}

/// Copy a file or a directory tree.
pub fn copy_path(source: &Path, target: &Path) -> Result<()> {
    if source.is_dir() {
        copy_dir_recursive(source, target)
    } else {
        copy_file(source, target)
    }
}

/// Move a file or directory.
///
/// Falls back to copy and delete when source and target are on different filesystems.
pub fn move_path(source: &Path, target: &Path) -> Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::CrossesDevices => {
            copy_path(source, target)?;
            let removed = if source.is_dir() {
                fs::remove_dir_all(source)
            } else {
                fs::remove_file(source)
            };
            removed.with_context(|| format!("Failed to remove source after copy: {}", source.display()))
        }
        Err(error) => {
            Err(error).with_context(|| format!("Failed to move {} -> {}", source.display(), target.display()))
        }
    }
}
