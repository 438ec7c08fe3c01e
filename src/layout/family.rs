//! Schema family detection and per-family layout constants.
//!
//! Each historical export template is a [`SchemaFamily`] variant that owns
//! its header depth, data-row start, canonical pressure position and the
//! names of the columns the resolver and sentinel filter look for.

use crate::constants::{MODERN_SCHEMA_FIRST_YEAR, legacy, modern_downcast, modern_upcast};
use crate::models::CastType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static FOLDER_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[-_ ])((?:19|20)\d{2})(?:[-_ ]|$)").expect("folder year pattern is valid")
});

/// Historical layout variant of a CTD table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaFamily {
    /// Survey CSVs up to 2015, shared by upcasts and downcasts
    Legacy,
    /// Spreadsheet-era downcasts
    ModernDowncast,
    /// Spreadsheet-era upcasts
    ModernUpcast,
}

impl SchemaFamily {
    /// Resolve the family of a table from its path and normalized headers.
    ///
    /// The survey year in the enclosing folder name decides first; header
    /// inspection settles files without a year or without a cast type.
    pub fn detect(path: &Path, column_names: &[&str]) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let cast_type = CastType::from_filename(&filename);
        let year = source_year(path);

        let family = match (year, cast_type) {
            (Some(year), _) if year < MODERN_SCHEMA_FIRST_YEAR => SchemaFamily::Legacy,
            (Some(_), CastType::Downcast) => SchemaFamily::ModernDowncast,
            (Some(_), CastType::Upcast) => SchemaFamily::ModernUpcast,
            _ => Self::from_headers(column_names),
        };

        debug!(
            "Detected {} for {} (year={:?}, cast={})",
            family,
            filename,
            year,
            cast_type
        );

        family
    }

    /// Infer the family from header names alone
    pub fn from_headers(column_names: &[&str]) -> Self {
        let has = |name: &str| column_names.contains(&name);

        if has(modern_upcast::STATION_COLUMN) || modern_upcast::PRESSURE_ALIASES.iter().any(|a| has(a))
        {
            SchemaFamily::ModernUpcast
        } else if has(modern_downcast::DEPTH_COLUMN)
            || modern_downcast::PRESSURE_ALIASES.iter().any(|a| has(a))
        {
            SchemaFamily::ModernDowncast
        } else {
            SchemaFamily::Legacy
        }
    }

    /// Pressure column names, most common first
    pub fn pressure_aliases(&self) -> &'static [&'static str] {
        match self {
            SchemaFamily::Legacy => legacy::PRESSURE_ALIASES,
            SchemaFamily::ModernDowncast => modern_downcast::PRESSURE_ALIASES,
            SchemaFamily::ModernUpcast => modern_upcast::PRESSURE_ALIASES,
        }
    }

    /// Depth column expected immediately after the pressure column
    pub fn depth_column(&self) -> &'static str {
        match self {
            SchemaFamily::Legacy => legacy::DEPTH_COLUMN,
            SchemaFamily::ModernDowncast => modern_downcast::DEPTH_COLUMN,
            SchemaFamily::ModernUpcast => modern_upcast::DEPTH_COLUMN,
        }
    }

    /// Canonical 1-based position of the pressure column in the augmented
    /// table, used as the fallback data-column start
    pub fn default_data_start(&self) -> usize {
        match self {
            SchemaFamily::Legacy => legacy::DEFAULT_DATA_START,
            SchemaFamily::ModernDowncast => modern_downcast::DEFAULT_DATA_START,
            SchemaFamily::ModernUpcast => modern_upcast::DEFAULT_DATA_START,
        }
    }

    /// Leading rows that hold column metadata and survive sentinel filtering
    pub fn preserved_head_rows(&self) -> usize {
        match self {
            SchemaFamily::Legacy => legacy::PRESERVED_HEAD_ROWS,
            SchemaFamily::ModernDowncast => modern_downcast::PRESERVED_HEAD_ROWS,
            SchemaFamily::ModernUpcast => modern_upcast::PRESERVED_HEAD_ROWS,
        }
    }

    pub fn station_column(&self) -> &'static str {
        match self {
            SchemaFamily::Legacy => legacy::STATION_COLUMN,
            SchemaFamily::ModernDowncast => modern_downcast::STATION_COLUMN,
            SchemaFamily::ModernUpcast => modern_upcast::STATION_COLUMN,
        }
    }

    /// First spreadsheet row holding measured values
    pub fn data_row_start(&self) -> usize {
        match self {
            SchemaFamily::Legacy => legacy::DATA_ROW_START,
            SchemaFamily::ModernDowncast => modern_downcast::DATA_ROW_START,
            SchemaFamily::ModernUpcast => modern_upcast::DATA_ROW_START,
        }
    }

    /// Number of rows forming the column header (label, units, status)
    pub fn header_rows(&self) -> usize {
        match self {
            SchemaFamily::Legacy => legacy::HEADER_ROWS,
            SchemaFamily::ModernDowncast => modern_downcast::HEADER_ROWS,
            SchemaFamily::ModernUpcast => modern_upcast::HEADER_ROWS,
        }
    }

    pub fn extra_identifier_columns(&self) -> &'static [usize] {
        match self {
            SchemaFamily::ModernUpcast => modern_upcast::EXTRA_IDENTIFIER_COLUMNS,
            _ => &[],
        }
    }

    /// Spreadsheet exports carry trailing empty rows
    pub fn drops_blank_rows(&self) -> bool {
        !matches!(self, SchemaFamily::Legacy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaFamily::Legacy => "legacy",
            SchemaFamily::ModernDowncast => "modern_downcast",
            SchemaFamily::ModernUpcast => "modern_upcast",
        }
    }
}

impl fmt::Display for SchemaFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Survey year taken from the nearest ancestor directory whose name embeds
/// one, e.g. `UW-2014_Data`
pub fn source_year(path: &Path) -> Option<i32> {
    path.parent()?
        .ancestors()
        .filter_map(|dir| dir.file_name())
        .find_map(|name| {
            let name = name.to_string_lossy();
            FOLDER_YEAR
                .captures(&name)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok())
        })
}
