//! Batch-level bookkeeping: the review list, per-file failures and the
//! JSON run report.

use super::{FileOutcome, FileReport};
use crate::error::{Result, UnxtabError};
use crate::layout::Deviation;
use crate::models::{ProcessingStats, file_name_of};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One schema deviation that needs a human look
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewEntry {
    pub filename: String,
    pub path: PathBuf,
    pub deviation: Deviation,
}

/// Files whose layout fell back to defaults or looked suspicious
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ReviewList {
    entries: Vec<ReviewEntry>,
}

impl ReviewList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: &Path, deviation: Deviation) {
        self.entries.push(ReviewEntry {
            filename: file_name_of(path),
            path: path.to_path_buf(),
            deviation,
        });
    }

    pub fn extend(&mut self, path: &Path, deviations: impl IntoIterator<Item = Deviation>) {
        for deviation in deviations {
            self.push(path, deviation);
        }
    }

    pub fn entries(&self) -> &[ReviewEntry] {
        &self.entries
    }

    /// Flagged files, first occurrence order, without repeats. Tables
    /// sharing a name in different folders stay apart.
    pub fn files(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = Vec::new();
        for entry in &self.entries {
            if !paths.contains(&entry.path.as_path()) {
                paths.push(&entry.path);
            }
        }
        paths
    }

    pub fn entries_for<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a ReviewEntry> {
        self.entries.iter().filter(move |e| e.path == path)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.iter().any(|e| e.filename == filename)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A table that could not be prepared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    pub filename: String,
    pub path: PathBuf,
    pub error: String,
}

/// A discovered file that was not loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Accumulated state of one batch run
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub started_at: DateTime<Utc>,
    pub stats: ProcessingStats,
    pub review: ReviewList,
    pub reports: Vec<FileReport>,
    pub failures: Vec<FailureEntry>,
    pub skipped: Vec<SkippedEntry>,
}

impl BatchContext {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            stats: ProcessingStats::default(),
            review: ReviewList::new(),
            reports: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Fold one file's outcome into the batch
    pub fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Processed(report) => {
                self.stats.files_processed += 1;
                self.stats.rows_written += report.rows_written;
                self.stats.rows_removed += report.rows_removed;
                if !report.deviations.is_empty() {
                    self.stats.files_flagged += 1;
                    self.review
                        .extend(&report.source, report.deviations.iter().cloned());
                }
                if report.conversion.is_failure() {
                    self.stats.tool_failures += 1;
                }
                self.reports.push(*report);
            }
            FileOutcome::Skipped { path, reason } => {
                self.stats.files_skipped += 1;
                self.skipped.push(SkippedEntry { path, reason });
            }
            FileOutcome::Failed { path, error } => {
                self.stats.files_failed += 1;
                self.failures.push(FailureEntry {
                    filename: file_name_of(&path),
                    path,
                    error: error.to_string(),
                });
            }
        }
    }

    pub fn to_report(&self) -> BatchReport<'_> {
        BatchReport {
            generated_at: Utc::now(),
            started_at: self.started_at,
            stats: &self.stats,
            review: &self.review,
            files: &self.reports,
            failures: &self.failures,
            skipped: &self.skipped,
        }
    }

    /// Write the run report as pretty JSON
    pub fn write_report(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_report())?;
        std::fs::write(path, json).map_err(|source| UnxtabError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for BatchContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialized form of a finished batch
#[derive(Debug, Serialize)]
pub struct BatchReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub stats: &'a ProcessingStats,
    pub review: &'a ReviewList,
    pub files: &'a [FileReport],
    pub failures: &'a [FailureEntry],
    pub skipped: &'a [SkippedEntry],
}
