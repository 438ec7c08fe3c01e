//! CTD un-crosstab preparation library
//!
//! Prepares cross-tabulated CTD cast tables from oceanographic survey
//! archives for conversion into long format by the external `un-xtab`
//! utility.
//!
//! This library provides tools for:
//! - Normalizing header names and cell values
//! - Prepending provenance columns to every row
//! - Removing rows with no station assigned
//! - Resolving the pivot layout of each historical schema family
//! - Emitting the pivot config artifact and running the conversion

pub mod cli;
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod layout;
pub mod models;
pub mod pivot_config;
pub mod processor;
pub mod table;

pub use config::{PivotToolConfig, UnxtabConfig};
pub use driver::{PivotInvocation, PivotTool, ToolOutput, UnxtabCommand};
pub use error::{Result, UnxtabError};
pub use layout::{Deviation, Resolution, ResolvedLayout, SchemaFamily, resolve_layout};
pub use models::{ArtifactPaths, CastType, LayoutDescriptor, Provenance, Span};
pub use pivot_config::PivotConfig;
pub use processor::pipeline::{PreparedTable, TablePipeline};
pub use processor::review::{BatchContext, ReviewList};
pub use processor::{BatchProcessor, ConversionStatus, FileReport, process_file};
