//! Error handling for CTD table preparation.
//!
//! Provides error types with context for table loading, artifact writing,
//! pivot tool invocation and configuration failures. Schema deviations are
//! not errors: they are collected as review entries instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnxtabError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Source directory not found at path: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Failed to read table {path}: {source}")]
    TableRead {
        path: PathBuf,
        #[source]
        source: polars::error::PolarsError,
    },

    #[error("Failed to write table {path}: {source}")]
    TableWrite {
        path: PathBuf,
        #[source]
        source: polars::error::PolarsError,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch pivot tool {program}: {source}")]
    ToolLaunch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("Invalid pivot config at line {line}: {reason}")]
    PivotConfigParse { line: usize, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Directory traversal failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UnxtabError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn config_parse(line: usize, reason: impl Into<String>) -> Self {
        Self::PivotConfigParse {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UnxtabError>;
