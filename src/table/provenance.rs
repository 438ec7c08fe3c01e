//! Provenance column injection.

use crate::constants::{CAST_TYPE_COLUMN, SOURCE_FILENAME_COLUMN, SOURCE_PATH_COLUMN};
use crate::error::Result;
use crate::models::Provenance;
use polars::prelude::*;

/// Prepend `source_path`, `source_filename` and `cast_type`, each constant
/// across all rows. The remaining columns keep their order.
pub fn inject_provenance(df: &DataFrame, provenance: &Provenance) -> Result<DataFrame> {
    let height = df.height();
    let constant = |name: &str, value: &str| Column::new(name.into(), vec![value; height]);

    let mut columns = Vec::with_capacity(df.width() + 3);
    columns.push(constant(SOURCE_PATH_COLUMN, &provenance.source_path));
    columns.push(constant(SOURCE_FILENAME_COLUMN, &provenance.source_filename));
    columns.push(constant(CAST_TYPE_COLUMN, provenance.cast_type.as_str()));
    columns.extend(df.get_columns().iter().cloned());

    Ok(DataFrame::new(columns)?)
}
