//! Planning and execution of additional file transfers for grouped track operations.

use std::path::Path;

use crate::additional_files::config::Config;
use crate::additional_files::destination::DestinationResolver;
use crate::additional_files::fs_ops::{copy_path, create_parent_dirs, move_path, unique_path};
use crate::additional_files::grouping::{OperationGroup, group_operations};
use crate::additional_files::logger::FileLogger;
use crate::additional_files::matcher::{PatternMatcher, ScannedPaths};
use crate::additional_files::template::TemplateEngine;
use crate::additional_files::types::{AlbumMetadata, OperationKind, SessionReport, TrackOperation, Transfer};
use crate::{get_relative_path_or_filename, path_to_string, print_bold, print_error, print_warning};

/// Runs the matcher and resolver for every album group and performs the transfers.
pub struct BatchProcessor<'a> {
    config: &'a Config,
    matcher: PatternMatcher<'a>,
    resolver: DestinationResolver<'a>,
    logger: Option<FileLogger>,
}

impl<'a> BatchProcessor<'a> {
    /// Create a processor. Opens the log file if one is configured.
    #[must_use]
    pub fn new(config: &'a Config, engine: &'a dyn TemplateEngine) -> Self {
        let logger = config
            .log_file
            .as_deref()
            .and_then(|path| match FileLogger::new(path) {
                Ok(logger) => Some(logger),
                Err(error) => {
                    print_warning!("Logging to file disabled: {error:#}");
                    None
                }
            });

        Self {
            config,
            matcher: PatternMatcher::from_config(config),
            resolver: DestinationResolver::from_config(config, engine),
            logger,
        }
    }

    /// Process copied tracks first, then moved tracks.
    ///
    /// Each pass tracks scanned source directories separately.
    pub fn run<'b>(
        &mut self,
        copied: impl IntoIterator<Item = &'b TrackOperation>,
        moved: impl IntoIterator<Item = &'b TrackOperation>,
    ) -> SessionReport {
        let copied: Vec<&TrackOperation> = copied.into_iter().collect();
        let moved: Vec<&TrackOperation> = moved.into_iter().collect();
        let mut report = SessionReport::default();

        if let Some(logger) = self.logger.as_mut() {
            logger.log_session_start(self.config, copied.len(), moved.len());
        }

        self.process(OperationKind::Copy, copied, &mut report);
        self.process(OperationKind::Move, moved, &mut report);

        if let Some(logger) = self.logger.as_mut() {
            logger.log_summary(&report);
        }
        report
    }

    /// Handle all operations of one kind.
    pub fn process<'b>(
        &mut self,
        kind: OperationKind,
        operations: impl IntoIterator<Item = &'b TrackOperation>,
        report: &mut SessionReport,
    ) {
        let mut scanned = ScannedPaths::new();
        for group in group_operations(operations) {
            match group {
                Ok(group) => {
                    let transfers = self.gather_transfers(&group, &mut scanned, report);
                    for transfer in transfers {
                        self.execute(kind, &transfer, report);
                    }
                }
                Err(error) => {
                    print_error!("Skipping album: {error:#}");
                    if let Some(logger) = self.logger.as_mut() {
                        logger.log_failure("album", &format!("{error:#}"));
                    }
                    report.failed_groups += 1;
                }
            }
        }
    }

    /// Find the additional files of one album and compute their destinations.
    fn gather_transfers(
        &mut self,
        group: &OperationGroup,
        scanned: &mut ScannedPaths,
        report: &mut SessionReport,
    ) -> Vec<Transfer> {
        if self.config.verbose {
            print_bold!(
                "{} -> {} ({} by {}, {} tracks)",
                path_to_string(&group.source_dir),
                path_to_string(&group.destination_dir),
                group.key.1,
                group.key.0,
                group.track_count
            );
        }

        let metadata = AlbumMetadata::new(&group.item, &group.destination_dir);
        let mut transfers = Vec::new();

        for matched in self.matcher.match_patterns(&group.source_dir, scanned) {
            let Ok(relative) = matched.path.strip_prefix(&group.source_dir) else {
                print_warning!(
                    "Matched path is outside the album directory: {}",
                    path_to_string(&matched.path)
                );
                report.failed += 1;
                continue;
            };

            if self.config.verbose {
                println!(
                    "  {}: {}",
                    matched.category,
                    get_relative_path_or_filename(&matched.path, &group.source_dir)
                );
            }

            match self.resolver.resolve(relative, &matched.category, &metadata) {
                Ok(destination) => transfers.push(Transfer::new(matched.path.clone(), destination)),
                Err(error) => {
                    print_warning!("{error:#}");
                    if let Some(logger) = self.logger.as_mut() {
                        logger.log_failure(&path_to_string(&matched.path), &format!("{error:#}"));
                    }
                    report.failed += 1;
                }
            }
        }

        transfers
    }

    /// Copy or move a single additional file.
    fn execute(&mut self, kind: OperationKind, transfer: &Transfer, report: &mut SessionReport) {
        if !transfer.source.exists() {
            print_warning!("Skipping missing source file: {}", path_to_string(&transfer.source));
            self.log_skip(&transfer.source, "missing source");
            report.skipped += 1;
            return;
        }
        if transfer.destination.exists() {
            print_warning!(
                "Skipping already present destination file: {}",
                path_to_string(&transfer.destination)
            );
            self.log_skip(&transfer.destination, "destination exists");
            report.skipped += 1;
            return;
        }

        let transfer = Transfer::new(transfer.source.clone(), unique_path(&transfer.destination));

        if self.config.dryrun {
            println!("Would {kind} additional file: {transfer}");
        } else {
            let result = create_parent_dirs(&transfer.destination).and_then(|()| match kind {
                OperationKind::Copy => copy_path(&transfer.source, &transfer.destination),
                OperationKind::Move => move_path(&transfer.source, &transfer.destination),
            });
            if let Err(error) = result {
                print_warning!("Failed to process file: {transfer}: {error:#}");
                if let Some(logger) = self.logger.as_mut() {
                    logger.log_failure(&transfer.to_string(), &format!("{error:#}"));
                }
                report.failed += 1;
                return;
            }
            println!("{} additional file: {transfer}", kind.verb());
        }

        if let Some(logger) = self.logger.as_mut() {
            logger.log_transfer(kind, &transfer, self.config.dryrun);
        }
        match kind {
            OperationKind::Copy => report.copied += 1,
            OperationKind::Move => report.moved += 1,
        }
    }

    fn log_skip(&mut self, path: &Path, reason: &str) {
        if let Some(logger) = self.logger.as_mut() {
            logger.log_skip(path, reason);
        }
    }
}
