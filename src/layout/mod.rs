//! Layout resolution for pivoting.
//!
//! Decides where row-identifier columns end and measured-value columns
//! begin, and how many rows form the column header. Source files drift from
//! their template, so the resolver never fails: when the canonical columns
//! are missing or misplaced it falls back to the family default and reports
//! a [`Deviation`] for manual review.

pub mod family;

pub use family::{SchemaFamily, source_year};

use crate::models::{LayoutDescriptor, Span};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// A departure from a family's canonical layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Deviation {
    /// None of the family's pressure aliases is present
    PressureMissing { fallback: usize },
    /// Pressure found and confirmed by depth, but not where the template puts it
    PressureMisplaced { found: usize, expected: usize },
    DepthMissing { column: String, fallback: usize },
    /// Depth does not immediately follow pressure
    DepthMisplaced {
        column: String,
        found: usize,
        expected: usize,
        fallback: usize,
    },
    DataStartBeyondWidth { start: usize, width: usize },
    NoDataRows { start: usize, end: usize },
    StationColumnMissing { column: String },
    /// Fixed identifier columns the table is too narrow to hold
    ExtraIdentifierBeyondWidth { columns: Vec<usize>, width: usize },
}

impl fmt::Display for Deviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deviation::PressureMissing { fallback } => write!(
                f,
                "pressure column not in headers, using column {} as data start",
                fallback
            ),
            Deviation::PressureMisplaced { found, expected } => write!(
                f,
                "pressure column at {} instead of {}, using {}",
                found, expected, found
            ),
            Deviation::DepthMissing { column, fallback } => write!(
                f,
                "depth column '{}' not in headers, using column {} as data start",
                column, fallback
            ),
            Deviation::DepthMisplaced {
                column,
                found,
                expected,
                fallback,
            } => write!(
                f,
                "depth column '{}' at {} instead of {}, using column {} as data start",
                column, found, expected, fallback
            ),
            Deviation::DataStartBeyondWidth { start, width } => write!(
                f,
                "data start {} beyond table width {}, clamped",
                start, width
            ),
            Deviation::NoDataRows { start, end } => {
                write!(f, "no data rows (rows {}-{})", start, end)
            }
            Deviation::StationColumnMissing { column } => write!(
                f,
                "station column '{}' not in headers, sentinel rows kept",
                column
            ),
            Deviation::ExtraIdentifierBeyondWidth { columns, width } => {
                let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
                write!(
                    f,
                    "identifier columns {} beyond table width {}, left out",
                    columns.join(","),
                    width
                )
            }
        }
    }
}

/// Outcome of checking a table against its family's canonical layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved,
    Deviated(Vec<Deviation>),
}

impl Resolution {
    pub fn from_deviations(deviations: Vec<Deviation>) -> Self {
        if deviations.is_empty() {
            Resolution::Resolved
        } else {
            Resolution::Deviated(deviations)
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved)
    }

    pub fn deviations(&self) -> &[Deviation] {
        match self {
            Resolution::Resolved => &[],
            Resolution::Deviated(deviations) => deviations,
        }
    }
}

/// A layout together with how it was reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayout {
    pub layout: LayoutDescriptor,
    pub resolution: Resolution,
}

/// Locate the first data column: the pressure column when its depth
/// companion confirms it, otherwise the family default
pub fn locate_data_start(family: SchemaFamily, column_names: &[&str]) -> (usize, Vec<Deviation>) {
    let fallback = family.default_data_start();
    let depth_column = family.depth_column();
    let position_of = |name: &str| column_names.iter().position(|c| *c == name).map(|i| i + 1);

    let pressure = family
        .pressure_aliases()
        .iter()
        .find_map(|alias| position_of(alias));
    let depth = position_of(depth_column);

    let Some(pressure) = pressure else {
        let mut deviations = vec![Deviation::PressureMissing { fallback }];
        if depth.is_none() {
            deviations.push(Deviation::DepthMissing {
                column: depth_column.to_string(),
                fallback,
            });
        }
        return (fallback, deviations);
    };

    match depth {
        Some(found) if found == pressure + 1 => {
            if pressure == fallback {
                (pressure, Vec::new())
            } else {
                (
                    pressure,
                    vec![Deviation::PressureMisplaced {
                        found: pressure,
                        expected: fallback,
                    }],
                )
            }
        }
        Some(found) => (
            fallback,
            vec![Deviation::DepthMisplaced {
                column: depth_column.to_string(),
                found,
                expected: pressure + 1,
                fallback,
            }],
        ),
        None => (
            fallback,
            vec![Deviation::DepthMissing {
                column: depth_column.to_string(),
                fallback,
            }],
        ),
    }
}

/// Resolve the pivot layout of an augmented, filtered table described by
/// its column names and row count
pub fn resolve_layout(
    family: SchemaFamily,
    column_names: &[&str],
    row_count: usize,
) -> ResolvedLayout {
    let width = column_names.len();
    let (mut data_start, mut deviations) = locate_data_start(family, column_names);

    if data_start > width {
        deviations.push(Deviation::DataStartBeyondWidth {
            start: data_start,
            width,
        });
        data_start = width;
    }

    // Pressure and depth stay in the data range but are also row keys
    let row_identifier_column_end = (data_start + 1).min(width);

    // +1 for the spreadsheet header line
    let data_row_range = Span::new(family.data_row_start(), row_count + 1);
    if data_row_range.is_empty() {
        deviations.push(Deviation::NoDataRows {
            start: data_row_range.start,
            end: data_row_range.end,
        });
    }

    let (extra_identifier_columns, beyond_width): (Vec<usize>, Vec<usize>) = family
        .extra_identifier_columns()
        .iter()
        .copied()
        .partition(|&column| column <= width);
    if !beyond_width.is_empty() {
        deviations.push(Deviation::ExtraIdentifierBeyondWidth {
            columns: beyond_width,
            width,
        });
    }

    let layout = LayoutDescriptor {
        family,
        data_column_range: Span::new(data_start, width),
        data_row_range,
        row_identifier_column_end,
        header_row_range: Span::new(1, family.header_rows()),
        extra_identifier_columns,
        total_columns: width,
    };

    debug!(
        "Resolved {} layout: data_columns={} data_rows={} row_headers=1-{} header_rows={}",
        family,
        layout.data_column_range,
        layout.data_row_range,
        layout.row_identifier_column_end,
        layout.header_row_range
    );

    for deviation in &deviations {
        warn!("Layout deviation ({}): {}", family, deviation);
    }

    ResolvedLayout {
        layout,
        resolution: Resolution::from_deviations(deviations),
    }
}

/// Resolve the pivot layout of a table
pub fn resolve_frame(family: SchemaFamily, df: &DataFrame) -> ResolvedLayout {
    let names: Vec<&str> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .collect();
    resolve_layout(family, &names, df.height())
}
