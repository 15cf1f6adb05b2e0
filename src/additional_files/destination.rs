//! Destination path computation for matched additional files.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use itertools::Itertools;

use crate::additional_files::config::{Config, PathFormatRules};
use crate::additional_files::fs_ops::Sanitizer;
use crate::additional_files::template::{Fields, TemplateEngine};
use crate::additional_files::types::AlbumMetadata;
use crate::{os_str_to_string, path_to_file_stem_string, path_to_string};

/// Renders destination paths from category templates.
pub struct DestinationResolver<'a> {
    path_formats: &'a PathFormatRules,
    engine: &'a dyn TemplateEngine,
    sanitizer: &'a Sanitizer,
    path_sep_replace: &'a str,
}

impl<'a> DestinationResolver<'a> {
    #[must_use]
    pub fn new(
        path_formats: &'a PathFormatRules,
        engine: &'a dyn TemplateEngine,
        sanitizer: &'a Sanitizer,
        path_sep_replace: &'a str,
    ) -> Self {
        Self {
            path_formats,
            engine,
            sanitizer,
            path_sep_replace,
        }
    }

    #[must_use]
    pub fn from_config(config: &'a Config, engine: &'a dyn TemplateEngine) -> Self {
        Self::new(
            &config.path_formats,
            engine,
            &config.sanitizer,
            &config.path_sep_replace,
        )
    }

    /// Compute the destination for a file at `relative_path` inside the album source directory.
    ///
    /// The template result is relative to the album destination directory unless it is absolute.
    /// Only the final path component is sanitized.
    ///
    /// # Errors
    /// Returns an error if the template cannot be rendered or the result has no file name.
    pub fn resolve(&self, relative_path: &Path, category: &str, metadata: &AlbumMetadata) -> Result<PathBuf> {
        let extension = relative_path
            .extension()
            .map(|ext| format!(".{}", os_str_to_string(ext)))
            .unwrap_or_default();
        let basename = path_to_file_stem_string(relative_path);
        let flattened = relative_path
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(os_str_to_string(part)),
                _ => None,
            })
            .join(self.path_sep_replace);
        let filename = flattened.strip_suffix(&extension).unwrap_or(&flattened);

        let fields = self.fields(metadata, &basename, filename);
        let template = self.path_formats.template_for(category);
        let rendered = self
            .engine
            .render(template, &fields)
            .with_context(|| format!("Failed to resolve destination for {}", path_to_string(relative_path)))?;

        let destination = metadata.album_path.join(format!("{rendered}{extension}"));
        self.sanitize_file_name(&destination)
    }

    /// Template values. Path separators are replaced in everything except `albumpath`.
    fn fields(&self, metadata: &AlbumMetadata, basename: &str, filename: &str) -> Fields {
        let for_path = |value: &str| value.replace(std::path::is_separator, self.path_sep_replace);
        Fields::from([
            ("artist".to_string(), for_path(&metadata.artist)),
            ("albumartist".to_string(), for_path(&metadata.album_artist)),
            ("album".to_string(), for_path(&metadata.album)),
            ("albumpath".to_string(), path_to_string(&metadata.album_path)),
            ("basename".to_string(), for_path(basename)),
            ("filename".to_string(), for_path(filename)),
        ])
    }

    fn sanitize_file_name(&self, path: &Path) -> Result<PathBuf> {
        let file_name = path
            .file_name()
            .with_context(|| format!("Destination has no file name: {}", path_to_string(path)))?;
        let sanitized = self.sanitizer.sanitize(&os_str_to_string(file_name));
        if sanitized.is_empty() {
            anyhow::bail!("Destination file name is empty after sanitizing: {}", path_to_string(path));
        }
        Ok(path.with_file_name(sanitized))
    }
}
