//! Main processing engine.
//!
//! Orchestrates the batch workflow: discover cast tables under a survey
//! root, prepare each one independently, write its artifacts, run the
//! pivot tool and collect everything that needs review.

pub mod discovery;
pub mod pipeline;
pub mod review;

#[cfg(test)]
pub mod tests;

use self::discovery::{DiscoveredFile, FileDiscovery, FileKind};
use self::pipeline::TablePipeline;
use self::review::BatchContext;

use crate::config::UnxtabConfig;
use crate::driver::{PivotInvocation, PivotTool, ToolOutput, UnxtabCommand};
use crate::error::{Result, UnxtabError};
use crate::layout::{Deviation, SchemaFamily};
use crate::models::{ArtifactPaths, LayoutDescriptor};

use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::{debug, error, info, warn};

/// What happened when the pivot tool was run for a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionStatus {
    /// Conversion disabled for this run
    Skipped,
    Completed(ToolOutput),
    LaunchFailed { error: String },
}

impl ConversionStatus {
    /// Launch failure or non-zero exit
    pub fn is_failure(&self) -> bool {
        match self {
            ConversionStatus::Skipped => false,
            ConversionStatus::Completed(output) => !output.success(),
            ConversionStatus::LaunchFailed { .. } => true,
        }
    }
}

/// Everything recorded about one prepared table
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub source: PathBuf,
    pub family: SchemaFamily,
    pub layout: LayoutDescriptor,
    pub deviations: Vec<Deviation>,
    pub paths: ArtifactPaths,
    pub rows_written: usize,
    pub rows_removed: usize,
    pub blank_rows_dropped: usize,
    pub conversion: ConversionStatus,
}

/// Per-file result inside a batch
#[derive(Debug)]
pub enum FileOutcome {
    Processed(Box<FileReport>),
    Skipped { path: PathBuf, reason: String },
    Failed { path: PathBuf, error: UnxtabError },
}

/// Prepare one table, write its artifacts and run the pivot tool on them.
///
/// A failing or unlaunchable tool is recorded in the report; only load and
/// write failures are errors.
pub fn process_file(
    pipeline: &TablePipeline,
    path: &Path,
    tool: Option<&dyn PivotTool>,
) -> Result<FileReport> {
    info!("Processing {}", path.display());

    let mut prepared = pipeline.prepare(path)?;
    let paths = pipeline.write(&mut prepared)?;

    let conversion = match tool {
        Some(tool) => run_tool(tool, &paths),
        None => ConversionStatus::Skipped,
    };

    Ok(FileReport {
        source: prepared.source.clone(),
        family: prepared.family,
        rows_written: prepared.table.height(),
        rows_removed: prepared.rows_removed,
        blank_rows_dropped: prepared.blank_rows_dropped,
        deviations: prepared.deviations().to_vec(),
        layout: prepared.layout,
        paths,
        conversion,
    })
}

fn run_tool(tool: &dyn PivotTool, paths: &ArtifactPaths) -> ConversionStatus {
    match tool.run(&PivotInvocation::from(paths)) {
        Ok(output) => {
            if output.success() {
                debug!("Converted {}", paths.untabbed.display());
                if !output.stdout.trim().is_empty() {
                    debug!("Pivot tool output: {}", output.stdout.trim());
                }
            } else {
                warn!(
                    "Pivot tool exited with {:?} for {}: {}",
                    output.exit_code,
                    paths.config.display(),
                    output.stderr.trim()
                );
            }
            ConversionStatus::Completed(output)
        }
        Err(e) => {
            warn!("{}", e);
            ConversionStatus::LaunchFailed {
                error: e.to_string(),
            }
        }
    }
}

fn process_discovered(
    pipeline: &TablePipeline,
    file: DiscoveredFile,
    tool: Option<&dyn PivotTool>,
) -> FileOutcome {
    match file.kind {
        FileKind::Unsupported { extension } => {
            warn!(
                "Skipping {}: .{} files cannot be loaded",
                file.path.display(),
                extension
            );
            FileOutcome::Skipped {
                path: file.path,
                reason: format!("unsupported extension .{}", extension),
            }
        }
        FileKind::Supported => match process_file(pipeline, &file.path, tool) {
            Ok(report) => FileOutcome::Processed(Box::new(report)),
            Err(e) => {
                error!("Failed to process {}: {}", file.path.display(), e);
                FileOutcome::Failed {
                    path: file.path,
                    error: e,
                }
            }
        },
    }
}

/// Batch processor for a survey archive
pub struct BatchProcessor {
    source_root: PathBuf,
    config: UnxtabConfig,
    tool: Option<Arc<dyn PivotTool>>,
    show_progress: bool,
}

impl BatchProcessor {
    /// Create a processor; the pivot tool is taken from the configuration
    pub fn new(source_root: PathBuf, config: UnxtabConfig) -> Result<Self> {
        if !source_root.is_dir() {
            return Err(UnxtabError::SourceNotFound { path: source_root });
        }
        config.validate()?;

        let tool: Option<Arc<dyn PivotTool>> = if config.tool.enabled {
            Some(Arc::new(UnxtabCommand::from_config(&config.tool)))
        } else {
            None
        };

        Ok(Self {
            source_root,
            config,
            tool,
            show_progress: true,
        })
    }

    /// Replace the pivot tool
    pub fn with_tool(mut self, tool: Arc<dyn PivotTool>) -> Self {
        self.tool = Some(tool);
        self
    }

    /// Write artifacts only
    pub fn without_tool(mut self) -> Self {
        self.tool = None;
        self
    }

    /// Toggle console output and the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &UnxtabConfig {
        &self.config
    }

    /// Main processing entry point
    ///
    /// Tables are independent: each runs on the blocking pool, at most
    /// `jobs` at a time, and outcomes are folded in discovery order.
    pub async fn process(&self) -> Result<BatchContext> {
        let start_time = Instant::now();
        let mut context = BatchContext::new();

        if self.show_progress {
            println!("{}", "Starting CTD table preparation".bright_green().bold());
            println!(
                "  {} {}",
                "Source:".bright_cyan(),
                self.source_root.display()
            );
            println!("\n{}", "Discovering cast tables...".bright_yellow());
        }

        let discovery = FileDiscovery::new(self.source_root.clone(), &self.config)?;
        let files = discovery.discover().await?;
        context.stats.files_discovered = files.len();

        let supported = files.iter().filter(|f| f.is_supported()).count();
        info!(
            "Discovered {} cast tables ({} loadable) under {}",
            files.len(),
            supported,
            self.source_root.display()
        );
        if self.show_progress {
            println!(
                "  {} {} cast tables ({} loadable)",
                "Found".bright_green(),
                files.len().to_string().bright_white().bold(),
                supported.to_string().bright_white().bold()
            );
        }

        if files.is_empty() {
            context.stats.processing_time_ms = start_time.elapsed().as_millis();
            return Ok(context);
        }

        let progress = self.progress_bar(files.len() as u64);
        let pipeline = Arc::new(TablePipeline::new(self.config.clone()));
        let jobs = self.config.jobs.max(1);
        debug!("Processing with {} concurrent tables", jobs);

        let outcomes = stream::iter(files.into_iter().map(|file| {
            let pipeline = Arc::clone(&pipeline);
            let tool = self.tool.clone();
            async move {
                let path = file.path.clone();
                task::spawn_blocking(move || process_discovered(&pipeline, file, tool.as_deref()))
                    .await
                    .unwrap_or_else(|e| FileOutcome::Failed {
                        error: UnxtabError::ProcessingFailed {
                            path: path.clone(),
                            reason: e.to_string(),
                        },
                        path,
                    })
            }
        }))
        .buffered(jobs);
        let mut outcomes = std::pin::pin!(outcomes);

        while let Some(outcome) = outcomes.next().await {
            progress.inc(1);
            context.record(outcome);
        }
        progress.finish_and_clear();

        context.stats.processing_time_ms = start_time.elapsed().as_millis();
        info!(
            "Prepared {} tables, {} failed, {} skipped, {} flagged for review",
            context.stats.files_processed,
            context.stats.files_failed,
            context.stats.files_skipped,
            context.stats.files_flagged
        );

        Ok(context)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("Preparing tables");
        pb
    }
}
