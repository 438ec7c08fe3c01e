//! Pivot configuration artifact.
//!
//! One section-keyed text document per table tells the un-crosstab utility
//! which block of the augmented table holds measured values, which columns
//! form the row key and which header rows become output fields:
//!
//! ```text
//! [2014_stationA_downcast_m]
//! data_columns=11-42
//! data_rows=4-131
//! row_headers=1-12
//! row_headers_row=1
//! column_header_rows=1-3
//! column_group_count=1
//! column_header_label_1=result_value
//! header_as_column_1=1,1,col_name
//! header_as_column_2=2,1,units
//! header_as_column_3=3,1,ctd_status
//! ```

use crate::constants::pivot_keys::*;
use crate::error::{Result, UnxtabError};
use crate::models::{LayoutDescriptor, Span};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Row key columns: a contiguous run from column 1 plus discrete extras
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHeaders {
    pub end: usize,
    pub extra: Vec<usize>,
}

impl fmt::Display for RowHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1-{}", self.end)?;
        for column in &self.extra {
            write!(f, ",{}", column)?;
        }
        Ok(())
    }
}

/// A column-header row copied into an output field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderAsColumn {
    pub row: usize,
    pub group: usize,
    pub name: String,
}

/// In-memory form of the config artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotConfig {
    pub section: String,
    pub data_columns: Span,
    pub data_rows: Span,
    pub row_headers: RowHeaders,
    pub row_headers_row: usize,
    pub column_header_rows: Span,
    pub column_group_count: usize,
    pub column_header_labels: Vec<String>,
    pub header_as_columns: Vec<HeaderAsColumn>,
}

impl PivotConfig {
    /// Build the artifact for a resolved layout
    pub fn from_layout(section: impl Into<String>, layout: &LayoutDescriptor) -> Self {
        let header_as_columns = HEADER_FIELD_NAMES
            .iter()
            .take(layout.header_row_range.end)
            .enumerate()
            .map(|(i, name)| HeaderAsColumn {
                row: i + 1,
                group: 1,
                name: name.to_string(),
            })
            .collect();

        Self {
            section: section.into(),
            data_columns: layout.data_column_range,
            data_rows: layout.data_row_range,
            row_headers: RowHeaders {
                end: layout.row_identifier_column_end,
                extra: layout.extra_identifier_columns.clone(),
            },
            row_headers_row: 1,
            column_header_rows: layout.header_row_range,
            column_group_count: 1,
            column_header_labels: vec![RESULT_VALUE_LABEL.to_string()],
            header_as_columns,
        }
    }

    /// Render the artifact text, one `key=value` per line
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Write the artifact; failures are fatal for this table only
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render()).map_err(|source| UnxtabError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Wrote pivot config [{}] to {}", self.section, path.display());
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Parse artifact text. Blank lines and `#` comments are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut section = None;
        let mut data_columns = None;
        let mut data_rows = None;
        let mut row_headers = None;
        let mut row_headers_row = None;
        let mut column_header_rows = None;
        let mut column_group_count = None;
        let mut labels: Vec<(usize, String)> = Vec::new();
        let mut header_as_columns: Vec<(usize, HeaderAsColumn)> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                if section.is_some() {
                    return Err(UnxtabError::config_parse(line_no, "more than one section"));
                }
                section = Some(name.trim().to_string());
                continue;
            }

            if section.is_none() {
                return Err(UnxtabError::config_parse(line_no, "key before section header"));
            }

            let (key, value) = line
                .split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .ok_or_else(|| UnxtabError::config_parse(line_no, "expected key=value"))?;

            match key {
                DATA_COLUMNS => data_columns = Some(parse_span(value, line_no)?),
                DATA_ROWS => data_rows = Some(parse_span(value, line_no)?),
                ROW_HEADERS => row_headers = Some(parse_row_headers(value, line_no)?),
                ROW_HEADERS_ROW => row_headers_row = Some(parse_index(value, line_no)?),
                COLUMN_HEADER_ROWS => column_header_rows = Some(parse_span(value, line_no)?),
                COLUMN_GROUP_COUNT => column_group_count = Some(parse_index(value, line_no)?),
                _ => {
                    if let Some(n) = key.strip_prefix(COLUMN_HEADER_LABEL_PREFIX) {
                        labels.push((parse_index(n, line_no)?, value.to_string()));
                    } else if let Some(n) = key.strip_prefix(HEADER_AS_COLUMN_PREFIX) {
                        let position = parse_index(n, line_no)?;
                        header_as_columns.push((position, parse_header_as_column(value, line_no)?));
                    } else {
                        return Err(UnxtabError::config_parse(
                            line_no,
                            format!("unknown key '{}'", key),
                        ));
                    }
                }
            }
        }

        let missing = |key: &str| UnxtabError::config_parse(0, format!("missing {}", key));
        labels.sort_by_key(|(n, _)| *n);
        header_as_columns.sort_by_key(|(n, _)| *n);

        Ok(Self {
            section: section.ok_or_else(|| missing("section header"))?,
            data_columns: data_columns.ok_or_else(|| missing(DATA_COLUMNS))?,
            data_rows: data_rows.ok_or_else(|| missing(DATA_ROWS))?,
            row_headers: row_headers.ok_or_else(|| missing(ROW_HEADERS))?,
            row_headers_row: row_headers_row.ok_or_else(|| missing(ROW_HEADERS_ROW))?,
            column_header_rows: column_header_rows.ok_or_else(|| missing(COLUMN_HEADER_ROWS))?,
            column_group_count: column_group_count.ok_or_else(|| missing(COLUMN_GROUP_COUNT))?,
            column_header_labels: labels.into_iter().map(|(_, label)| label).collect(),
            header_as_columns: header_as_columns.into_iter().map(|(_, h)| h).collect(),
        })
    }
}

impl fmt::Display for PivotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.section)?;
        writeln!(f, "{}={}", DATA_COLUMNS, self.data_columns)?;
        writeln!(f, "{}={}", DATA_ROWS, self.data_rows)?;
        writeln!(f, "{}={}", ROW_HEADERS, self.row_headers)?;
        writeln!(f, "{}={}", ROW_HEADERS_ROW, self.row_headers_row)?;

        // A single header row is written as a bare index
        if self.column_header_rows.start == self.column_header_rows.end {
            writeln!(f, "{}={}", COLUMN_HEADER_ROWS, self.column_header_rows.start)?;
        } else {
            writeln!(f, "{}={}", COLUMN_HEADER_ROWS, self.column_header_rows)?;
        }

        writeln!(f, "{}={}", COLUMN_GROUP_COUNT, self.column_group_count)?;
        for (i, label) in self.column_header_labels.iter().enumerate() {
            writeln!(f, "{}{}={}", COLUMN_HEADER_LABEL_PREFIX, i + 1, label)?;
        }
        for (i, header) in self.header_as_columns.iter().enumerate() {
            writeln!(
                f,
                "{}{}={},{},{}",
                HEADER_AS_COLUMN_PREFIX,
                i + 1,
                header.row,
                header.group,
                header.name
            )?;
        }
        Ok(())
    }
}

fn parse_index(value: &str, line: usize) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| UnxtabError::config_parse(line, format!("'{}' is not an index", value)))
}

/// `a-b`, or a bare `a` meaning `a-a`
fn parse_span(value: &str, line: usize) -> Result<Span> {
    match value.split_once('-') {
        Some((start, end)) => Ok(Span::new(parse_index(start, line)?, parse_index(end, line)?)),
        None => {
            let index = parse_index(value, line)?;
            Ok(Span::new(index, index))
        }
    }
}

fn parse_row_headers(value: &str, line: usize) -> Result<RowHeaders> {
    let mut parts = value.split(',');
    let span = parse_span(parts.next().unwrap_or_default(), line)?;
    if span.start != 1 {
        return Err(UnxtabError::config_parse(
            line,
            format!("row headers must start at column 1, found {}", span.start),
        ));
    }
    let extra = parts
        .map(|part| parse_index(part, line))
        .collect::<Result<Vec<_>>>()?;

    Ok(RowHeaders {
        end: span.end,
        extra,
    })
}

fn parse_header_as_column(value: &str, line: usize) -> Result<HeaderAsColumn> {
    let fields: Vec<&str> = value.splitn(3, ',').map(str::trim).collect();
    match fields.as_slice() {
        [row, group, name] if !name.is_empty() => Ok(HeaderAsColumn {
            row: parse_index(row, line)?,
            group: parse_index(group, line)?,
            name: name.to_string(),
        }),
        _ => Err(UnxtabError::config_parse(
            line,
            format!("expected row,group,name but found '{}'", value),
        )),
    }
}
