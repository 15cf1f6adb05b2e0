//! Configuration for additional file handling.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::{fmt, fs};

use anyhow::Context;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::additional_files::fs_ops::Sanitizer;
use crate::additional_files::template::Template;
use crate::colorize_bool;

/// Default replacement for path separators inside template values.
pub const DEFAULT_PATH_SEP_REPLACE: &str = "_";

/// Template used for categories without a configured path.
pub const DEFAULT_PATH_FORMAT: &str = "$albumpath/$filename";

/// File extensions owned by the media importer.
pub const DEFAULT_MEDIA_EXTENSIONS: &[&str] = &[
    "mp3", "aac", "alac", "ogg", "opus", "flac", "ape", "wv", "mpc", "asf", "aiff", "dsf", "wav",
];

static DEFAULT_TEMPLATE: LazyLock<Template> =
    LazyLock::new(|| Template::parse(DEFAULT_PATH_FORMAT).expect("Invalid default path template"));

/// Config from the user config file.
#[derive(Debug, Default, Deserialize)]
pub struct ExtraFilesConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub dryrun: bool,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default)]
    pub media_extensions: Option<Vec<String>>,
    #[serde(default)]
    pub path_sep_replace: Option<String>,
    #[serde(default, deserialize_with = "ordered_map")]
    pub paths: Vec<(String, String)>,
    #[serde(default, deserialize_with = "ordered_map")]
    pub patterns: Vec<(String, Vec<String>)>,
    #[serde(default)]
    pub replace: Vec<(String, String)>,
    #[serde(default)]
    pub verbose: bool,
}

/// Wrapper needed for parsing the config section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    extrafiles: ExtraFilesConfig,
}

/// Glob patterns configured for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPatterns {
    pub category: String,
    pub patterns: Vec<String>,
}

/// Ordered category to path template rules.
#[derive(Debug, Clone)]
pub struct PathFormatRules {
    rules: Vec<(String, Template)>,
    default: Template,
}

/// Final config created from the user config file and CLI arguments.
#[derive(Debug)]
pub struct Config {
    pub debug: bool,
    pub dryrun: bool,
    pub log_file: Option<PathBuf>,
    pub media_extensions: HashSet<String>,
    pub path_formats: PathFormatRules,
    pub path_sep_replace: String,
    pub patterns: Vec<CategoryPatterns>,
    pub sanitizer: Sanitizer,
    pub verbose: bool,
}

/// Deserialize a map into a list of entries, keeping the order from the file.
fn ordered_map<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct OrderedMapVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a table of category names")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, V>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
}

impl ExtraFilesConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    pub fn get_user_config() -> anyhow::Result<Self> {
        let Some(path) = crate::config::config_path() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {error}",
                path.display()
            )),
        }
    }

    /// Read config from an explicitly given file, which must exist.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parse config from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.extrafiles)
            .with_context(|| "Failed to parse config TOML")
    }
}

impl PathFormatRules {
    /// Compile path templates for each category.
    ///
    /// # Errors
    /// Returns an error if a template cannot be parsed.
    pub fn new(paths: &[(String, String)]) -> anyhow::Result<Self> {
        let rules = paths
            .iter()
            .map(|(category, source)| {
                Template::parse(source)
                    .map(|template| (category.clone(), template))
                    .with_context(|| format!("Invalid path template for category '{category}'"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            rules,
            default: DEFAULT_TEMPLATE.clone(),
        })
    }

    /// Template for the given category: the first matching rule, or the default.
    #[must_use]
    pub fn template_for(&self, category: &str) -> &Template {
        self.rules
            .iter()
            .find(|(name, _)| name == category)
            .map_or(&self.default, |(_, template)| template)
    }

    /// Number of configured rules, not counting the default.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for PathFormatRules {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default: DEFAULT_TEMPLATE.clone(),
        }
    }
}

impl Config {
    /// Validate and compile the user config.
    ///
    /// # Errors
    /// Returns an error for invalid glob patterns, path templates or replace regexes.
    pub fn from_user_config(user_config: ExtraFilesConfig) -> anyhow::Result<Self> {
        let patterns = user_config
            .patterns
            .into_iter()
            .map(|(category, patterns)| {
                for pattern in &patterns {
                    glob::Pattern::new(pattern)
                        .with_context(|| format!("Invalid glob pattern for category '{category}': '{pattern}'"))?;
                }
                Ok(CategoryPatterns { category, patterns })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let path_formats = PathFormatRules::new(&user_config.paths)?;

        let sanitizer = if user_config.replace.is_empty() {
            Sanitizer::default()
        } else {
            Sanitizer::from_pairs(&user_config.replace)?
        };

        let media_extensions = user_config.media_extensions.map_or_else(
            || DEFAULT_MEDIA_EXTENSIONS.iter().map(ToString::to_string).collect(),
            |extensions| {
                extensions
                    .into_iter()
                    .map(|ext| ext.trim_start_matches('.').to_string())
                    .collect()
            },
        );

        let path_sep_replace = user_config
            .path_sep_replace
            .unwrap_or_else(|| DEFAULT_PATH_SEP_REPLACE.to_string());

        Ok(Self {
            debug: user_config.debug,
            dryrun: user_config.dryrun,
            log_file: user_config.log_file.as_deref().map(crate::config::expand_home),
            media_extensions,
            path_formats,
            path_sep_replace,
            patterns,
            sanitizer,
            verbose: user_config.verbose,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            dryrun: false,
            log_file: None,
            media_extensions: DEFAULT_MEDIA_EXTENSIONS.iter().map(ToString::to_string).collect(),
            path_formats: PathFormatRules::default(),
            path_sep_replace: DEFAULT_PATH_SEP_REPLACE.to_string(),
            patterns: Vec::new(),
            sanitizer: Sanitizer::default(),
            verbose: false,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Config:")?;
        writeln!(f, "  debug: {}", colorize_bool(self.debug))?;
        writeln!(f, "  dryrun: {}", colorize_bool(self.dryrun))?;
        writeln!(f, "  verbose: {}", colorize_bool(self.verbose))?;
        writeln!(f, "  path_sep_replace: \"{}\"", self.path_sep_replace)?;
        if let Some(log_file) = &self.log_file {
            writeln!(f, "  log_file: {}", log_file.display())?;
        }
        writeln!(f, "  sanitize rules: {}", self.sanitizer.len())?;
        let mut extensions: Vec<_> = self.media_extensions.iter().collect();
        extensions.sort();
        writeln!(f, "  media_extensions: {extensions:?}")?;
        writeln!(f, "  patterns:")?;
        for category in &self.patterns {
            writeln!(f, "    {}: {:?}", category.category, category.patterns)?;
        }
        writeln!(f, "  paths:")?;
        for (category, template) in &self.path_formats.rules {
            writeln!(f, "    {category}: {template}")?;
        }
        write!(f, "    (default): {}", self.path_formats.default)
    }
}
