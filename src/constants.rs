//! Application constants for the CTD un-crosstab preparation pipeline
//!
//! This module contains provenance column names, file naming conventions,
//! pivot config vocabulary and the fixed layout constants of each historical
//! schema family.

// =============================================================================
// Provenance Columns
// =============================================================================

/// Absolute path of the originating table
pub const SOURCE_PATH_COLUMN: &str = "source_path";

/// Base name of the originating table
pub const SOURCE_FILENAME_COLUMN: &str = "source_filename";

/// Record subtype derived from the file name
pub const CAST_TYPE_COLUMN: &str = "cast_type";

/// Provenance columns in the order they lead every augmented table
pub const PROVENANCE_COLUMNS: [&str; 3] =
    [SOURCE_PATH_COLUMN, SOURCE_FILENAME_COLUMN, CAST_TYPE_COLUMN];

// =============================================================================
// Cleaning Rules
// =============================================================================

/// Station value marking a row with no station assigned
pub const SENTINEL_STATION: &str = "None";

/// Column-name token that collides with a reserved word in the loading SQL
pub const RESERVED_COLUMN_TOKEN: &str = "Cast";

/// Replacement for [`RESERVED_COLUMN_TOKEN`]
pub const RESERVED_COLUMN_ALIAS: &str = "cast_no";

// =============================================================================
// File Naming
// =============================================================================

/// Suffix appended to the source stem for the augmented table and its config
pub const AUGMENTED_SUFFIX: &str = "_m";

/// Extension of the augmented table
pub const AUGMENTED_EXTENSION: &str = "csv";

/// Extension of the pivot config artifact
pub const CONFIG_EXTENSION: &str = "cfg";

/// Prefix of the long-format file written by the pivot tool
pub const UNTABBED_PREFIX: &str = "untabbed_";

/// File patterns selected by default during discovery
pub const DEFAULT_FILE_PATTERNS: &[&str] = &["*downcast.*", "*upcast.*"];

/// Extensions the pipeline can load directly
pub const DEFAULT_SUPPORTED_EXTENSIONS: &[&str] = &["csv"];

/// First survey year exported with the spreadsheet-era templates
pub const MODERN_SCHEMA_FIRST_YEAR: i32 = 2016;

// =============================================================================
// Pivot Tool
// =============================================================================

/// Default location of the un-crosstab utility
pub const DEFAULT_TOOL_PROGRAM: &str = "~/houston-dc-jobs/data-management/bin/un-xtab.py";

/// Flag selecting config-file driven mode
pub const DEFAULT_TOOL_MODE_FLAG: &str = "-c";

// =============================================================================
// Pivot Config Vocabulary
// =============================================================================

pub mod pivot_keys {
    pub const DATA_COLUMNS: &str = "data_columns";
    pub const DATA_ROWS: &str = "data_rows";
    pub const ROW_HEADERS: &str = "row_headers";
    pub const ROW_HEADERS_ROW: &str = "row_headers_row";
    pub const COLUMN_HEADER_ROWS: &str = "column_header_rows";
    pub const COLUMN_GROUP_COUNT: &str = "column_group_count";
    pub const COLUMN_HEADER_LABEL_PREFIX: &str = "column_header_label_";
    pub const HEADER_AS_COLUMN_PREFIX: &str = "header_as_column_";

    /// Output field that receives the measured values
    pub const RESULT_VALUE_LABEL: &str = "result_value";

    /// Output field names for each column-header row, top to bottom
    pub const HEADER_FIELD_NAMES: [&str; 3] = ["col_name", "units", "ctd_status"];
}

// =============================================================================
// Schema Families
// =============================================================================

/// Survey CSVs up to 2015; upcasts and downcasts share one layout
pub mod legacy {
    pub const PRESSURE_ALIASES: &[&str] = &["Pressure"];
    pub const DEPTH_COLUMN: &str = "Depth";
    pub const DEFAULT_DATA_START: usize = 11;
    pub const PRESERVED_HEAD_ROWS: usize = 2;
    pub const STATION_COLUMN: &str = "Station";
    pub const DATA_ROW_START: usize = 4;
    pub const HEADER_ROWS: usize = 3;
}

/// Spreadsheet-era downcasts (2016 onward)
pub mod modern_downcast {
    pub const PRESSURE_ALIASES: &[&str] =
        &["prDM: Pressure  Digiquartz", "prdM: Pressure  Strain Gauge"];
    pub const DEPTH_COLUMN: &str = "depSM: Depth";
    pub const DEFAULT_DATA_START: usize = 14;
    pub const PRESERVED_HEAD_ROWS: usize = 1;
    pub const STATION_COLUMN: &str = "Station";
    pub const DATA_ROW_START: usize = 3;
    pub const HEADER_ROWS: usize = 2;
}

/// Spreadsheet-era upcasts (2016 onward), bottle-style layout
pub mod modern_upcast {
    pub const PRESSURE_ALIASES: &[&str] = &["CTDPRS_DBAR"];
    pub const DEPTH_COLUMN: &str = "DEPTH (M)";
    pub const DEFAULT_DATA_START: usize = 17;
    pub const PRESERVED_HEAD_ROWS: usize = 0;
    pub const STATION_COLUMN: &str = "STATION_NO";
    pub const DATA_ROW_START: usize = 2;
    pub const HEADER_ROWS: usize = 1;

    /// Flag and comment columns that travel with the row key
    pub const EXTRA_IDENTIFIER_COLUMNS: &[usize] =
        &[21, 22, 25, 26, 32, 33, 39, 40, 44, 51, 56, 60, 62, 64];
}
