//! Configuration management and validation.
//!
//! Provides the batch configuration: which files to pick up, the cleaning
//! literals, concurrency and how to reach the pivot tool. Defaults match the
//! survey archive layout; a JSON file and CLI flags can override them.

use crate::constants::{
    DEFAULT_FILE_PATTERNS, DEFAULT_SUPPORTED_EXTENSIONS, DEFAULT_TOOL_MODE_FLAG,
    DEFAULT_TOOL_PROGRAM, RESERVED_COLUMN_ALIAS, RESERVED_COLUMN_TOKEN, SENTINEL_STATION,
};
use crate::error::{Result, UnxtabError};
use crate::table::ColumnNormalizer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// How to reach the un-crosstab utility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotToolConfig {
    /// Utility path; a leading `~/` is expanded
    pub program: PathBuf,

    /// Flag selecting config-file driven mode
    pub mode_flag: String,

    /// Run the utility after writing artifacts
    pub enabled: bool,
}

impl Default for PivotToolConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_TOOL_PROGRAM),
            mode_flag: DEFAULT_TOOL_MODE_FLAG.to_string(),
            enabled: true,
        }
    }
}

/// Global configuration for a preparation batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnxtabConfig {
    /// Glob patterns matched against file names during discovery
    pub file_patterns: Vec<String>,

    /// Extensions that can be loaded; other matches are skipped
    pub supported_extensions: Vec<String>,

    /// Station value marking unassigned rows
    pub sentinel_station: String,

    /// Column-name token to rename, and its replacement
    pub reserved_token: String,
    pub reserved_alias: String,

    /// Inclusive survey-year window taken from folder names
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,

    /// Tables processed concurrently
    pub jobs: usize,

    pub tool: PivotToolConfig,
}

impl Default for UnxtabConfig {
    fn default() -> Self {
        Self {
            file_patterns: DEFAULT_FILE_PATTERNS.iter().map(|p| p.to_string()).collect(),
            supported_extensions: DEFAULT_SUPPORTED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            sentinel_station: SENTINEL_STATION.to_string(),
            reserved_token: RESERVED_COLUMN_TOKEN.to_string(),
            reserved_alias: RESERVED_COLUMN_ALIAS.to_string(),
            from_year: None,
            to_year: None,
            jobs: 1,
            tool: PivotToolConfig::default(),
        }
    }
}

impl UnxtabConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Set the number of concurrent tables
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Restrict discovery to an inclusive range of survey years
    pub fn with_year_range(mut self, from_year: Option<i32>, to_year: Option<i32>) -> Self {
        self.from_year = from_year;
        self.to_year = to_year;
        self
    }

    pub fn with_tool_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.tool.program = program.into();
        self
    }

    /// Write artifacts only; never invoke the pivot tool
    pub fn without_conversion(mut self) -> Self {
        self.tool.enabled = false;
        self
    }

    pub fn with_file_patterns(mut self, patterns: Vec<String>) -> Self {
        self.file_patterns = patterns;
        self
    }

    /// Normalizer configured with this batch's reserved token
    pub fn normalizer(&self) -> ColumnNormalizer {
        ColumnNormalizer::new(&self.reserved_token, &self.reserved_alias)
    }

    /// Whether a table from the given survey year passes the configured
    /// window. Undated tables only pass when no window is set.
    pub fn year_in_range(&self, year: Option<i32>) -> bool {
        if self.from_year.is_none() && self.to_year.is_none() {
            return true;
        }
        year.is_some_and(|year| {
            self.from_year.is_none_or(|from| year >= from)
                && self.to_year.is_none_or(|to| year <= to)
        })
    }

    /// Check settings that would make every table fail the same way
    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(UnxtabError::configuration("jobs must be at least 1"));
        }
        if self.file_patterns.is_empty() {
            return Err(UnxtabError::configuration(
                "at least one file pattern is required",
            ));
        }
        if self.supported_extensions.is_empty() {
            return Err(UnxtabError::configuration(
                "at least one supported extension is required",
            ));
        }
        if self.sentinel_station.is_empty() {
            return Err(UnxtabError::configuration(
                "sentinel station must not be empty",
            ));
        }
        if let (Some(from), Some(to)) = (self.from_year, self.to_year) {
            if from > to {
                return Err(UnxtabError::configuration(format!(
                    "year range is empty ({} > {})",
                    from, to
                )));
            }
        }
        for pattern in &self.file_patterns {
            glob::Pattern::new(pattern).map_err(|source| UnxtabError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = UnxtabConfig::default();

        assert_eq!(config.file_patterns, vec!["*downcast.*", "*upcast.*"]);
        assert_eq!(config.sentinel_station, "None");
        assert_eq!(config.jobs, 1);
        assert!(config.tool.enabled);
        assert_eq!(config.tool.mode_flag, "-c");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = UnxtabConfig::default()
            .with_jobs(4)
            .with_year_range(Some(2016), None)
            .with_tool_program("/opt/un-xtab.py")
            .without_conversion();

        assert_eq!(config.jobs, 4);
        assert!(!config.tool.enabled);
        assert_eq!(config.tool.program, PathBuf::from("/opt/un-xtab.py"));
        assert!(config.year_in_range(Some(2016)));
        assert!(config.year_in_range(Some(2023)));
        assert!(!config.year_in_range(Some(2015)));
        assert!(!config.year_in_range(None));
        assert!(UnxtabConfig::default().year_in_range(None));
    }

    #[test]
    fn test_validation_failures() {
        assert!(UnxtabConfig::default().with_jobs(0).validate().is_err());
        assert!(
            UnxtabConfig::default()
                .with_year_range(Some(2020), Some(2010))
                .validate()
                .is_err()
        );
        assert!(matches!(
            UnxtabConfig::default()
                .with_file_patterns(vec!["[".to_string()])
                .validate(),
            Err(UnxtabError::Pattern { .. })
        ));
    }

    #[test]
    fn test_partial_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"jobs": 2, "to_year": 2015, "tool": {{"enabled": false}}}}"#
        )
        .unwrap();

        let config = UnxtabConfig::from_file(file.path()).unwrap();

        assert_eq!(config.jobs, 2);
        assert_eq!(config.to_year, Some(2015));
        assert!(!config.tool.enabled);
        assert_eq!(config.tool.mode_flag, "-c");
        assert_eq!(config.sentinel_station, "None");
    }
}
