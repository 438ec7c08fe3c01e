//! Command-line interface components.

use crate::config::UnxtabConfig;
use crate::models::file_name_of;
use crate::pivot_config::PivotConfig;
use crate::processor::BatchProcessor;
use crate::processor::pipeline::TablePipeline;
use crate::processor::review::BatchContext;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Parser, Debug)]
#[command(name = "ctd-unxtab")]
#[command(about = "Prepare CTD cast tables for un-crosstab conversion")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare every cast table under a survey root and run the pivot tool
    Process(ProcessArgs),
    /// Show how one table would be prepared, without writing anything
    Resolve(ResolveArgs),
}

#[derive(Parser, Debug)]
pub struct ProcessArgs {
    /// Survey root containing the cast tables
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path of the un-xtab utility
    #[arg(long, value_name = "PATH")]
    pub tool: Option<PathBuf>,

    /// Write artifacts but do not run the pivot tool
    #[arg(long)]
    pub skip_conversion: bool,

    /// Number of tables prepared concurrently
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// First survey year to include
    #[arg(long)]
    pub from_year: Option<i32>,

    /// Last survey year to include
    #[arg(long)]
    pub to_year: Option<i32>,

    /// Write a JSON report of the run
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Cast table to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Parse the rendered config back and verify it
    #[arg(long)]
    pub check: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ProcessArgs {
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Configuration file (or defaults) with command-line overrides applied
    pub fn build_config(&self) -> Result<UnxtabConfig> {
        let mut config = load_config(self.config.as_ref())?;

        if let Some(jobs) = self.jobs {
            config = config.with_jobs(clamp_jobs(jobs));
        }
        if self.from_year.is_some() || self.to_year.is_some() {
            let from_year = self.from_year.or(config.from_year);
            let to_year = self.to_year.or(config.to_year);
            config = config.with_year_range(from_year, to_year);
        }
        if let Some(tool) = &self.tool {
            config = config.with_tool_program(tool.clone());
        }
        if self.skip_conversion {
            config = config.without_conversion();
        }

        config.validate()?;
        Ok(config)
    }
}

impl ResolveArgs {
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<UnxtabConfig> {
    match path {
        Some(path) => UnxtabConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(UnxtabConfig::default()),
    }
}

/// Keep the worker count between one and the number of CPUs
fn clamp_jobs(requested: usize) -> usize {
    let cpus = num_cpus::get().max(1);
    if requested > cpus {
        warn!("Requested {} jobs, limiting to {} CPUs", requested, cpus);
    }
    requested.clamp(1, cpus)
}

/// Set up structured logging
pub fn setup_logging(log_level: &str, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ctd_unxtab={}", log_level)));

    if quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

/// Dispatch a parsed command line
pub async fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Process(args) => run_process(args).await,
        Commands::Resolve(args) => run_resolve(args),
    }
}

async fn run_process(args: ProcessArgs) -> Result<()> {
    setup_logging(args.get_log_level(), args.quiet);
    let config = args.build_config()?;

    let processor = BatchProcessor::new(args.root.clone(), config)?.with_progress(!args.quiet);
    let context = processor.process().await?;

    print_summary(&context);
    print_review(&context);

    if let Some(report) = &args.report {
        context
            .write_report(report)
            .with_context(|| format!("Failed to write report {}", report.display()))?;
        println!(
            "\n  {} {}",
            "Report written to".bright_cyan(),
            report.display()
        );
    }

    Ok(())
}

fn run_resolve(args: ResolveArgs) -> Result<()> {
    setup_logging(args.get_log_level(), true);
    let config = load_config(args.config.as_ref())?;

    let pipeline = TablePipeline::new(config);
    let prepared = pipeline
        .prepare(&args.file)
        .with_context(|| format!("Failed to prepare {}", args.file.display()))?;
    let layout = &prepared.layout;

    println!("{}", args.file.display().to_string().bright_white().bold());
    println!("  {} {}", "Family:".bright_cyan(), prepared.family);
    println!(
        "  {} {} of {}",
        "Data columns:".bright_cyan(),
        layout.data_column_range,
        layout.total_columns
    );
    println!("  {} {}", "Data rows:".bright_cyan(), layout.data_row_range);
    println!(
        "  {} 1-{}",
        "Row headers:".bright_cyan(),
        layout.row_identifier_column_end
    );
    println!(
        "  {} {}",
        "Sentinel rows removed:".bright_cyan(),
        prepared.rows_removed
    );

    if prepared.resolution.is_resolved() {
        println!("  {}", "Layout matches its template".bright_green());
    } else {
        println!("  {}", "Deviations:".bright_yellow());
        for deviation in prepared.deviations() {
            println!("    - {}", deviation);
        }
    }

    let rendered = prepared.pivot_config.render();
    println!("\n{}", rendered);

    if args.check {
        let parsed = PivotConfig::parse(&rendered).context("Rendered config does not parse")?;
        if parsed != prepared.pivot_config {
            bail!("Rendered config does not round-trip for {}", args.file.display());
        }
        println!("{}", "Config round-trip verified".bright_green());
    }

    Ok(())
}

/// Print the batch summary
pub fn print_summary(context: &BatchContext) {
    let stats = &context.stats;

    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Tables prepared:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Rows written:".bright_cyan(),
        stats.rows_written.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Unassigned rows removed:".bright_cyan(),
        stats.rows_removed.to_string().bright_white()
    );
    if stats.files_skipped > 0 {
        println!(
            "  {} {}",
            "Files skipped:".bright_yellow(),
            stats.files_skipped.to_string().bright_white()
        );
    }
    if stats.tool_failures > 0 {
        println!(
            "  {} {}",
            "Conversion failures:".bright_yellow(),
            stats.tool_failures.to_string().bright_white()
        );
    }
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_white()
        );
        for failure in &context.failures {
            println!("    {} {}", failure.filename.bright_red(), failure.error);
        }
    }
}

/// Print the files whose layout needs a manual look
pub fn print_review(context: &BatchContext) {
    if context.review.is_empty() {
        println!("\n{}", "No files need review".bright_green());
        return;
    }

    println!(
        "\n{} {}",
        "Files to review:".bright_yellow().bold(),
        context.review.files().len().to_string().bright_white()
    );
    for path in context.review.files() {
        println!("  {}", review_heading(path));
        for entry in context.review.entries_for(path) {
            println!("    - {}", entry.deviation);
        }
    }
}

/// Cruise folder and file name, enough to tell same-named casts apart
fn review_heading(path: &Path) -> String {
    let name = file_name_of(path);
    match path.parent().and_then(|parent| parent.file_name()) {
        Some(folder) => format!("{}/{}", folder.to_string_lossy(), name),
        None => name,
    }
}
