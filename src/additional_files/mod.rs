//! Additional files module for copying and moving the non-media files of an album.
//!
//! Tracks copied or moved by the importer are recorded into a [`Session`].
//! When the session finishes, the tracks are grouped by album, files matching the configured
//! glob patterns are found next to them, and each match is copied or moved to a destination
//! rendered from a per-category path template.

mod config;
mod destination;
mod fs_ops;
mod grouping;
mod logger;
mod matcher;
mod processor;
mod session;
mod template;
mod types;

pub use config::{
    CategoryPatterns, Config, DEFAULT_MEDIA_EXTENSIONS, DEFAULT_PATH_FORMAT, DEFAULT_PATH_SEP_REPLACE,
    ExtraFilesConfig, PathFormatRules,
};
pub use destination::DestinationResolver;
pub use fs_ops::{Sanitizer, copy_path, move_path, unique_path};
pub use grouping::{GroupKey, OperationGroup, common_path, group_operations};
pub use logger::FileLogger;
pub use matcher::{Matches, PatternMatcher, ScannedPaths};
pub use processor::BatchProcessor;
pub use session::Session;
pub use template::{Fields, StandardFunctions, Template, TemplateEngine};
pub use types::{
    AlbumMetadata, MISSING_VALUE, MatchedFile, MediaItem, OperationKind, SessionReport, TrackOperation, Transfer,
};
