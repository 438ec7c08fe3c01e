//! Header and cell whitespace stripping.

use crate::constants::{RESERVED_COLUMN_ALIAS, RESERVED_COLUMN_TOKEN};
use crate::error::Result;
use polars::prelude::*;

/// Strips whitespace from names and cells and renames the reserved token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNormalizer {
    reserved_token: String,
    reserved_alias: String,
}

impl Default for ColumnNormalizer {
    fn default() -> Self {
        Self::new(RESERVED_COLUMN_TOKEN, RESERVED_COLUMN_ALIAS)
    }
}

impl ColumnNormalizer {
    pub fn new(reserved_token: impl Into<String>, reserved_alias: impl Into<String>) -> Self {
        Self {
            reserved_token: reserved_token.into(),
            reserved_alias: reserved_alias.into(),
        }
    }

    /// Normalized form of one header name
    pub fn column_name(&self, name: &str) -> String {
        let trimmed = name.trim();
        if self.reserved_token.is_empty() {
            return trimmed.to_string();
        }
        trimmed.replace(&self.reserved_token, &self.reserved_alias)
    }

    /// Trim every column name and cell value. Row count and column order are
    /// unchanged.
    pub fn normalize(&self, df: &DataFrame) -> Result<DataFrame> {
        let columns = df
            .get_columns()
            .iter()
            .map(|column| {
                let name = self.column_name(column.name().as_str());
                let series = column.as_materialized_series().cast(&DataType::String)?;
                let trimmed: StringChunked = series
                    .str()?
                    .into_iter()
                    .map(|value| value.map(str::trim))
                    .collect();

                Ok(trimmed.with_name(name.into()).into_series().into_column())
            })
            .collect::<PolarsResult<Vec<Column>>>()?;

        Ok(DataFrame::new(columns)?)
    }
}
