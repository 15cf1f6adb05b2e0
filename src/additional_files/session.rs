//! Buffering of track operations reported by the host during one import session.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::additional_files::config::Config;
use crate::additional_files::processor::BatchProcessor;
use crate::additional_files::template::{StandardFunctions, TemplateEngine};
use crate::additional_files::types::{MediaItem, OperationKind, SessionReport, TrackOperation};

/// Collects copied and moved tracks and handles their additional files when finished.
pub struct Session<'a> {
    config: &'a Config,
    engine: &'a dyn TemplateEngine,
    copied: HashSet<TrackOperation>,
    moved: HashSet<TrackOperation>,
}

impl<'a> Session<'a> {
    /// Session using the standard template functions.
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self::with_engine(config, &StandardFunctions)
    }

    #[must_use]
    pub fn with_engine(config: &'a Config, engine: &'a dyn TemplateEngine) -> Self {
        Self {
            config,
            engine,
            copied: HashSet::new(),
            moved: HashSet::new(),
        }
    }

    /// Record a copied track. Returns false if the same operation was already recorded.
    pub fn record_copy(
        &mut self,
        item: MediaItem,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> bool {
        self.copied.insert(TrackOperation::new(item, source, destination))
    }

    /// Record a moved track. Returns false if the same operation was already recorded.
    pub fn record_move(
        &mut self,
        item: MediaItem,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> bool {
        self.moved.insert(TrackOperation::new(item, source, destination))
    }

    pub fn record(
        &mut self,
        kind: OperationKind,
        item: MediaItem,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> bool {
        match kind {
            OperationKind::Copy => self.record_copy(item, source, destination),
            OperationKind::Move => self.record_move(item, source, destination),
        }
    }

    /// Number of buffered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.copied.len() + self.moved.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.copied.is_empty() && self.moved.is_empty()
    }

    #[must_use]
    pub fn copied(&self) -> &HashSet<TrackOperation> {
        &self.copied
    }

    #[must_use]
    pub fn moved(&self) -> &HashSet<TrackOperation> {
        &self.moved
    }

    /// Process all buffered operations, copies before moves.
    pub fn finish(self) -> SessionReport {
        if self.is_empty() {
            return SessionReport::default();
        }
        let mut processor = BatchProcessor::new(self.config, self.engine);
        processor.run(&self.copied, &self.moved)
    }
}
