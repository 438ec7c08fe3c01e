//! Core data structures and types for CTD table preparation.
//!
//! Defines cast types, provenance, layout descriptors, file naming and
//! processing statistics used throughout the library.

use crate::constants::{
    AUGMENTED_EXTENSION, AUGMENTED_SUFFIX, CONFIG_EXTENSION, UNTABBED_PREFIX,
};
use crate::layout::SchemaFamily;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Record subtype of a CTD profile table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastType {
    Downcast,
    Upcast,
    Unknown,
}

impl CastType {
    /// Classify from a file name, case-insensitively. `downcast` wins when
    /// both tokens appear.
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.to_lowercase();

        if lower.contains("downcast") {
            CastType::Downcast
        } else if lower.contains("upcast") {
            CastType::Upcast
        } else {
            CastType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CastType::Downcast => "downcast",
            CastType::Upcast => "upcast",
            CastType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance values stamped onto every row of an augmented table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_path: String,
    pub source_filename: String,
    pub cast_type: CastType,
}

impl Provenance {
    /// Build provenance for a source file. Relative paths are made absolute
    /// against the current directory.
    pub fn from_path(path: &Path) -> Self {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let source_filename = file_name_of(path);

        Self {
            source_path: absolute.to_string_lossy().into_owned(),
            cast_type: CastType::from_filename(&source_filename),
            source_filename,
        }
    }
}

/// Inclusive, 1-based range of spreadsheet columns or rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Resolved shape of a table for pivoting
///
/// Computed once per table after filtering and consumed by the config
/// emitter. Positions are 1-based and count the provenance columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    pub family: SchemaFamily,
    pub data_column_range: Span,
    pub data_row_range: Span,
    pub row_identifier_column_end: usize,
    pub header_row_range: Span,
    pub extra_identifier_columns: Vec<usize>,
    pub total_columns: usize,
}

impl LayoutDescriptor {
    /// Check the structural invariants of the descriptor
    pub fn is_consistent(&self) -> bool {
        self.data_column_range.start <= self.data_column_range.end
            && self.data_column_range.end <= self.total_columns
            && self.header_row_range.end < self.data_row_range.start
            && self
                .extra_identifier_columns
                .iter()
                .all(|&column| column <= self.total_columns)
    }
}

/// Paths of the artifacts derived from one source table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub augmented: PathBuf,
    pub config: PathBuf,
    pub untabbed: PathBuf,
}

impl ArtifactPaths {
    /// Derive artifact paths next to the source: `<stem>_m.csv`,
    /// `<stem>_m.cfg` and `untabbed_<stem>_m.csv`
    pub fn for_source(source: &Path) -> Self {
        let parent = source.parent().unwrap_or_else(|| Path::new("."));
        let augmented_stem = augmented_stem(source);
        let augmented_name = format!("{}.{}", augmented_stem, AUGMENTED_EXTENSION);

        Self {
            augmented: parent.join(&augmented_name),
            config: parent.join(format!("{}.{}", augmented_stem, CONFIG_EXTENSION)),
            untabbed: parent.join(format!("{}{}", UNTABBED_PREFIX, augmented_name)),
        }
    }
}

/// Stem of the augmented table, also used as the pivot config section name
pub fn augmented_stem(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}", stem, AUGMENTED_SUFFIX)
}

/// Base name of a path as an owned string
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Batch processing statistics
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
    pub files_flagged: usize,
    pub tool_failures: usize,
    pub rows_written: usize,
    pub rows_removed: usize,
    pub processing_time_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_type_from_filename() {
        assert_eq!(
            CastType::from_filename("2014_stationA_downcast.csv"),
            CastType::Downcast
        );
        assert_eq!(
            CastType::from_filename("April2016_labUPCAST.csv"),
            CastType::Upcast
        );
        assert_eq!(CastType::from_filename("bottle_2019.csv"), CastType::Unknown);
        assert_eq!(CastType::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_provenance_is_absolute() {
        let provenance = Provenance::from_path(Path::new("data/2014_stationA_downcast.csv"));

        assert!(Path::new(&provenance.source_path).is_absolute());
        assert!(provenance.source_path.ends_with("2014_stationA_downcast.csv"));
        assert_eq!(provenance.source_filename, "2014_stationA_downcast.csv");
        assert_eq!(provenance.cast_type, CastType::Downcast);
    }

    #[test]
    fn test_artifact_paths() {
        let paths = ArtifactPaths::for_source(Path::new("/data/UW-2014_Data/a_upcast.csv"));

        assert_eq!(paths.augmented, Path::new("/data/UW-2014_Data/a_upcast_m.csv"));
        assert_eq!(paths.config, Path::new("/data/UW-2014_Data/a_upcast_m.cfg"));
        assert_eq!(
            paths.untabbed,
            Path::new("/data/UW-2014_Data/untabbed_a_upcast_m.csv")
        );
    }

    #[test]
    fn test_span_display() {
        assert_eq!(Span::new(11, 42).to_string(), "11-42");
        assert!(Span::new(4, 3).is_empty());
        assert!(!Span::new(4, 4).is_empty());
    }
}
