use std::fs;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use crate::additional_files::config::Config;
use crate::additional_files::types::{OperationKind, SessionReport, Transfer};
use crate::path_to_string;

/// Append-only action log with buffered writes.
pub struct FileLogger {
    writer: BufWriter<File>,
}

impl FileLogger {
    /// Open the log file for appending, creating it and its parent directories if needed.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be created.
    pub fn new(log_path: &Path) -> Result<Self> {
        if let Some(log_dir) = log_path.parent()
            && !log_dir.as_os_str().is_empty()
            && !log_dir.exists()
        {
            fs::create_dir_all(log_dir)
                .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    fn timestamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub fn log_session_start(&mut self, config: &Config, copies: usize, moves: usize) {
        let _ = writeln!(
            self.writer,
            "[{}] SESSION copied tracks: {copies}, moved tracks: {moves}",
            Self::timestamp()
        );
        let _ = writeln!(self.writer, "  dryrun: {}", config.dryrun);
        let _ = writeln!(self.writer, "  categories: {}", config.patterns.len());
        let _ = self.writer.flush();
    }

    pub fn log_transfer(&mut self, kind: OperationKind, transfer: &Transfer, dryrun: bool) {
        let action = if dryrun {
            format!("DRYRUN {}", kind.to_string().to_uppercase())
        } else {
            kind.to_string().to_uppercase()
        };
        let _ = writeln!(self.writer, "[{}] {action} {transfer}", Self::timestamp());
        let _ = self.writer.flush();
    }

    pub fn log_skip(&mut self, path: &Path, reason: &str) {
        let _ = writeln!(
            self.writer,
            "[{}] SKIP   \"{}\" | {reason}",
            Self::timestamp(),
            path_to_string(path)
        );
        let _ = self.writer.flush();
    }

    pub fn log_failure(&mut self, context: &str, error: &str) {
        let _ = writeln!(self.writer, "[{}] ERROR  {context} | {error}", Self::timestamp());
        let _ = self.writer.flush();
    }

    pub fn log_summary(&mut self, report: &SessionReport) {
        let _ = writeln!(self.writer, "[{}] SUMMARY {report}", Self::timestamp());
        let _ = self.writer.flush();
    }
}
