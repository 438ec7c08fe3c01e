//! File discovery module for CTD survey archives
//!
//! Walks a survey root, picks up cast tables by file-name pattern and
//! classifies them as loadable or not. Artifacts written by earlier runs are
//! never picked up again.

use crate::config::UnxtabConfig;
use crate::constants::{AUGMENTED_SUFFIX, UNTABBED_PREFIX};
use crate::error::{Result, UnxtabError};
use crate::layout::source_year;
use crate::models::file_name_of;

use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::debug;
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Whether a discovered file can be loaded as a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Supported,
    Unsupported { extension: String },
}

/// A candidate cast table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub kind: FileKind,
    /// Survey year from the nearest dated folder
    pub year: Option<i32>,
}

impl DiscoveredFile {
    pub fn is_supported(&self) -> bool {
        self.kind == FileKind::Supported
    }
}

/// File discovery component for survey archives
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    root: PathBuf,
    patterns: Vec<Pattern>,
    config: UnxtabConfig,
}

impl FileDiscovery {
    pub fn new(root: PathBuf, config: &UnxtabConfig) -> Result<Self> {
        let patterns = config
            .file_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|source| UnxtabError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            root,
            patterns,
            config: config.clone(),
        })
    }

    /// Discover candidate tables below the root, in file-name order
    ///
    /// A typical archive:
    /// ```text
    /// root/
    ///   UW-2014_Data/
    ///     2014_P4_downcast.csv
    ///     2014_P4_downcast_m.csv      (artifact, ignored)
    ///   2019_cruise/
    ///     2019_P4_upcast.xlsx         (unsupported)
    /// ```
    pub async fn discover(&self) -> Result<Vec<DiscoveredFile>> {
        if !self.root.is_dir() {
            return Err(UnxtabError::SourceNotFound {
                path: self.root.clone(),
            });
        }

        let discovery = self.clone();
        task::spawn_blocking(move || discovery.walk())
            .await
            .map_err(|e| UnxtabError::ProcessingFailed {
                path: self.root.clone(),
                reason: e.to_string(),
            })?
    }

    fn walk(&self) -> Result<Vec<DiscoveredFile>> {
        debug!("Searching for cast tables in: {}", self.root.display());

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.into_path();
            if !self.is_candidate(&path) {
                continue;
            }

            let year = source_year(&path);
            if !self.config.year_in_range(year) {
                debug!("Outside year range: {}", path.display());
                continue;
            }

            let kind = self.classify(&path);
            files.push(DiscoveredFile { path, kind, year });
        }

        debug!("Found {} candidate tables", files.len());
        Ok(files)
    }

    fn is_candidate(&self, path: &Path) -> bool {
        let name = file_name_of(path);
        if is_artifact(path, &name) {
            return false;
        }
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(&name, MATCH_OPTIONS))
    }

    fn classify(&self, path: &Path) -> FileKind {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if self
            .config
            .supported_extensions
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(&extension))
        {
            FileKind::Supported
        } else {
            FileKind::Unsupported { extension }
        }
    }
}

/// Files written by a previous run: augmented tables, their configs and
/// converted output
fn is_artifact(path: &Path, name: &str) -> bool {
    if name.starts_with(UNTABBED_PREFIX) {
        return true;
    }
    path.file_stem()
        .is_some_and(|stem| stem.to_string_lossy().ends_with(AUGMENTED_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Helper to create a small survey archive
    fn create_test_archive(temp_dir: &TempDir) -> PathBuf {
        let root = temp_dir.path().join("archive");

        let legacy = root.join("UW-2014_Data");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join("2014_P4_downcast.csv"), "x").unwrap();
        fs::write(legacy.join("2014_P4_downcast_m.csv"), "x").unwrap();
        fs::write(legacy.join("2014_P4_downcast_m.cfg"), "x").unwrap();
        fs::write(legacy.join("untabbed_2014_P4_downcast_m.csv"), "x").unwrap();
        fs::write(legacy.join("notes.txt"), "x").unwrap();

        let modern = root.join("2019_cruise");
        fs::create_dir_all(&modern).unwrap();
        fs::write(modern.join("2019_P4_Upcast.CSV"), "x").unwrap();
        fs::write(modern.join("2019_P5_upcast.xlsx"), "x").unwrap();

        root
    }

    fn names(files: &[DiscoveredFile]) -> Vec<String> {
        files.iter().map(|f| file_name_of(&f.path)).collect()
    }

    #[tokio::test]
    async fn test_discovers_casts_and_skips_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let root = create_test_archive(&temp_dir);

        let discovery = FileDiscovery::new(root, &UnxtabConfig::default()).unwrap();
        let files = discovery.discover().await.unwrap();

        assert_eq!(
            names(&files),
            vec![
                "2019_P4_Upcast.CSV",
                "2019_P5_upcast.xlsx",
                "2014_P4_downcast.csv"
            ]
        );
        assert!(files[0].is_supported());
        assert_eq!(
            files[1].kind,
            FileKind::Unsupported {
                extension: "xlsx".to_string()
            }
        );
        assert_eq!(files[2].year, Some(2014));
    }

    #[tokio::test]
    async fn test_year_range_filters_by_folder() {
        let temp_dir = TempDir::new().unwrap();
        let root = create_test_archive(&temp_dir);

        let config = UnxtabConfig::default().with_year_range(Some(2016), None);
        let files = FileDiscovery::new(root, &config)
            .unwrap()
            .discover()
            .await
            .unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.year == Some(2019)));
    }

    #[tokio::test]
    async fn test_undated_folder_only_passes_without_year_range() {
        let temp_dir = TempDir::new().unwrap();
        let root = create_test_archive(&temp_dir);
        let misc = root.join("misc");
        fs::create_dir_all(&misc).unwrap();
        fs::write(misc.join("station_downcast.csv"), "x").unwrap();

        let unbounded = FileDiscovery::new(root.clone(), &UnxtabConfig::default())
            .unwrap()
            .discover()
            .await
            .unwrap();
        let bounded = FileDiscovery::new(
            root,
            &UnxtabConfig::default().with_year_range(None, Some(2030)),
        )
        .unwrap()
        .discover()
        .await
        .unwrap();

        assert!(names(&unbounded).contains(&"station_downcast.csv".to_string()));
        assert_eq!(
            unbounded
                .iter()
                .find(|f| file_name_of(&f.path) == "station_downcast.csv")
                .map(|f| f.year),
            Some(None)
        );
        assert!(!names(&bounded).contains(&"station_downcast.csv".to_string()));
        assert_eq!(bounded.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("missing");

        let result = FileDiscovery::new(root.clone(), &UnxtabConfig::default())
            .unwrap()
            .discover()
            .await;

        match result {
            Err(UnxtabError::SourceNotFound { path }) => assert_eq!(path, root),
            other => panic!("Expected SourceNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_is_artifact() {
        assert!(is_artifact(Path::new("a_downcast_m.csv"), "a_downcast_m.csv"));
        assert!(is_artifact(Path::new("a_downcast_m.cfg"), "a_downcast_m.cfg"));
        assert!(is_artifact(
            Path::new("untabbed_a_downcast_m.csv"),
            "untabbed_a_downcast_m.csv"
        ));
        assert!(!is_artifact(Path::new("a_downcast.csv"), "a_downcast.csv"));
    }
}
