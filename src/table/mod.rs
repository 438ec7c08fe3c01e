//! Table loading, cleaning and writing.
//!
//! Tables are polars `DataFrame`s whose columns are all `String`: every CSV
//! is read with schema inference disabled, and typed parsing is left to the
//! pivot tool downstream.

pub mod normalize;
pub mod provenance;
pub mod sentinel;

pub use normalize::ColumnNormalizer;
pub use provenance::inject_provenance;
pub use sentinel::{FilterOutcome, SentinelFilter};

use crate::error::{Result, UnxtabError};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Read a delimited table with every column as a string
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|source| UnxtabError::TableRead {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(
        "Read {} ({} rows x {} columns)",
        path.display(),
        df.height(),
        df.width()
    );

    Ok(df)
}

/// Write a table as comma-delimited text with a header line
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(|source| UnxtabError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|source| UnxtabError::TableWrite {
            path: path.to_path_buf(),
            source,
        })?;

    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Column names of a table in order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Values of one column as strings; nulls stay `None`
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let values = series.str()?;

    Ok(values
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Drop rows whose every cell is null or empty
pub fn drop_blank_rows(df: &DataFrame) -> Result<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| column.as_materialized_series().cast(&DataType::String))
        .collect::<PolarsResult<Vec<Series>>>()?;
    let values = columns
        .iter()
        .map(|series| series.str())
        .collect::<PolarsResult<Vec<&StringChunked>>>()?;

    let keep = (0..df.height()).map(|row| {
        values
            .iter()
            .any(|column| column.get(row).is_some_and(|cell| !cell.is_empty()))
    });
    let mask = BooleanChunked::from_iter_values(PlSmallStr::from_static("keep"), keep);
    let kept = df.filter(&mask)?;

    let dropped = df.height() - kept.height();
    if dropped > 0 {
        debug!("Dropped {} blank rows", dropped);
    }

    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_read_table_keeps_everything_as_strings() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Station,Pressure,Depth").unwrap();
        writeln!(temp_file, "P12,1.5,1.49").unwrap();
        writeln!(temp_file, "P12,007,").unwrap();

        let df = read_table(temp_file.path()).unwrap();

        assert_eq!(df.shape(), (2, 3));
        assert_eq!(
            string_values(&df, "Pressure").unwrap(),
            vec![Some("1.5".to_string()), Some("007".to_string())]
        );
        assert_eq!(string_values(&df, "Depth").unwrap()[1], None);
    }

    #[test]
    fn test_read_missing_file_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.csv");

        match read_table(&missing) {
            Err(UnxtabError::TableRead { path, .. }) => assert_eq!(path, missing),
            other => panic!("Expected TableRead error, got {:?}", other),
        }
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");
        let mut df = polars::df!(
            "Station" => ["P12", "P22"],
            "Temp" => ["9.1", "8.7"]
        )
        .unwrap();

        write_table(&mut df, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Station,Temp\n"));
        let back = read_table(&path).unwrap();
        assert_eq!(column_names(&back), vec!["Station", "Temp"]);
        assert_eq!(back.height(), 2);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope").join("out.csv");
        let mut df = polars::df!("a" => ["1"]).unwrap();

        assert!(matches!(
            write_table(&mut df, &path),
            Err(UnxtabError::Write { .. })
        ));
    }

    #[test]
    fn test_drop_blank_rows() {
        let df = DataFrame::new(vec![
            Column::new("Station".into(), [Some("P12"), None, Some(""), Some("P22")]),
            Column::new("Temp".into(), [Some("9.1"), None, None, Some("")]),
        ])
        .unwrap();

        let kept = drop_blank_rows(&df).unwrap();

        assert_eq!(
            string_values(&kept, "Station").unwrap(),
            vec![Some("P12".to_string()), Some("P22".to_string())]
        );
    }
}
