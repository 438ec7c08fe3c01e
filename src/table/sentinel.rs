//! Removal of rows with no station assigned.
//!
//! Older templates keep units and calibration notes in the first rows under
//! the header; those rows are never treated as data, whatever their station
//! cell holds. Below them a blank station cell counts as unassigned.

use crate::constants::SENTINEL_STATION;
use crate::error::Result;
use crate::layout::SchemaFamily;
use polars::prelude::*;
use tracing::{debug, warn};

/// Drops sentinel-station rows below a preserved head
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelFilter {
    pub station_column: String,
    pub preserved_head: usize,
    pub sentinel: String,
}

/// Result of filtering one table
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub table: DataFrame,
    pub removed: usize,
    /// The station column was absent, so nothing was filtered
    pub station_missing: bool,
}

impl SentinelFilter {
    pub fn new(
        station_column: impl Into<String>,
        preserved_head: usize,
        sentinel: impl Into<String>,
    ) -> Self {
        Self {
            station_column: station_column.into(),
            preserved_head,
            sentinel: sentinel.into(),
        }
    }

    /// Filter configured from a family's station column and head depth
    pub fn for_family(family: SchemaFamily, sentinel: impl Into<String>) -> Self {
        Self::new(family.station_column(), family.preserved_head_rows(), sentinel)
    }

    /// Keep the first `preserved_head` rows, then drop every row whose
    /// station is null or equals the sentinel. Order is preserved.
    pub fn apply(&self, df: &DataFrame) -> Result<FilterOutcome> {
        if df.get_column_index(&self.station_column).is_none() {
            warn!(
                "Station column '{}' not found, skipping sentinel filter",
                self.station_column
            );
            return Ok(FilterOutcome {
                table: df.clone(),
                removed: 0,
                station_missing: true,
            });
        }

        if df.height() <= self.preserved_head {
            return Ok(FilterOutcome {
                table: df.clone(),
                removed: 0,
                station_missing: false,
            });
        }

        let stations = df
            .column(&self.station_column)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let keep = stations
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, station)| {
                row < self.preserved_head
                    || station.is_some_and(|station| station != self.sentinel)
            });
        let mask = BooleanChunked::from_iter_values(PlSmallStr::from_static("keep"), keep);
        let table = df.filter(&mask)?;
        let removed = df.height() - table.height();

        debug!(
            "Removed {} '{}' rows by {} (head of {} preserved)",
            removed, self.sentinel, self.station_column, self.preserved_head
        );

        Ok(FilterOutcome {
            table,
            removed,
            station_missing: false,
        })
    }
}

impl Default for SentinelFilter {
    fn default() -> Self {
        Self::for_family(SchemaFamily::Legacy, SENTINEL_STATION)
    }
}
