//! Per-table preparation pipeline
//!
//! Runs one source table through normalization, schema family detection,
//! provenance injection, sentinel filtering and layout resolution, then
//! writes the augmented table and its pivot config next to the source.

use crate::config::UnxtabConfig;
use crate::error::Result;
use crate::layout::{Deviation, Resolution, SchemaFamily, resolve_frame};
use crate::models::{ArtifactPaths, LayoutDescriptor, Provenance, augmented_stem};
use crate::pivot_config::PivotConfig;
use crate::table::{
    ColumnNormalizer, SentinelFilter, column_names, drop_blank_rows, inject_provenance,
    read_table, write_table,
};

use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A table ready to be written, with every decision made about it
#[derive(Debug, Clone)]
pub struct PreparedTable {
    pub source: PathBuf,
    pub family: SchemaFamily,
    pub provenance: Provenance,
    pub table: DataFrame,
    pub layout: LayoutDescriptor,
    pub resolution: Resolution,
    pub pivot_config: PivotConfig,
    pub rows_removed: usize,
    pub blank_rows_dropped: usize,
}

impl PreparedTable {
    pub fn deviations(&self) -> &[Deviation] {
        self.resolution.deviations()
    }
}

/// Table preparation with a fixed configuration
#[derive(Debug, Clone)]
pub struct TablePipeline {
    config: UnxtabConfig,
    normalizer: ColumnNormalizer,
}

impl TablePipeline {
    pub fn new(config: UnxtabConfig) -> Self {
        let normalizer = config.normalizer();
        Self { config, normalizer }
    }

    pub fn config(&self) -> &UnxtabConfig {
        &self.config
    }

    /// Load and prepare a table without writing anything
    pub fn prepare(&self, path: &Path) -> Result<PreparedTable> {
        let raw = read_table(path)?;
        self.prepare_frame(path, &raw)
    }

    /// Prepare an already loaded table as if read from `path`
    pub fn prepare_frame(&self, path: &Path, raw: &DataFrame) -> Result<PreparedTable> {
        let normalized = self.normalizer.normalize(raw)?;

        let names = column_names(&normalized);
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let family = SchemaFamily::detect(path, &name_refs);

        let (normalized, blank_rows_dropped) = if family.drops_blank_rows() {
            let kept = drop_blank_rows(&normalized)?;
            let dropped = normalized.height() - kept.height();
            (kept, dropped)
        } else {
            (normalized, 0)
        };

        let provenance = Provenance::from_path(path);
        let augmented = inject_provenance(&normalized, &provenance)?;

        let filter = SentinelFilter::for_family(family, &self.config.sentinel_station);
        let filtered = filter.apply(&augmented)?;

        let resolved = resolve_frame(family, &filtered.table);

        let mut deviations = Vec::new();
        if filtered.station_missing {
            deviations.push(Deviation::StationColumnMissing {
                column: filter.station_column.clone(),
            });
        }
        deviations.extend(resolved.resolution.deviations().iter().cloned());

        let pivot_config = PivotConfig::from_layout(augmented_stem(path), &resolved.layout);

        debug!(
            "Prepared {} as {}: {} rows kept, {} sentinel rows removed, {} deviations",
            path.display(),
            family,
            filtered.table.height(),
            filtered.removed,
            deviations.len()
        );

        Ok(PreparedTable {
            source: path.to_path_buf(),
            family,
            provenance,
            table: filtered.table,
            layout: resolved.layout,
            resolution: Resolution::from_deviations(deviations),
            pivot_config,
            rows_removed: filtered.removed,
            blank_rows_dropped,
        })
    }

    /// Write the augmented table, then its pivot config
    pub fn write(&self, prepared: &mut PreparedTable) -> Result<ArtifactPaths> {
        let paths = ArtifactPaths::for_source(&prepared.source);

        write_table(&mut prepared.table, &paths.augmented)?;
        prepared.pivot_config.write_to(&paths.config)?;

        Ok(paths)
    }
}

impl Default for TablePipeline {
    fn default() -> Self {
        Self::new(UnxtabConfig::default())
    }
}
