//! Reading data-standard tables.
//!
//! Tables are `;`-delimited CSV files with a header row. Exported headers
//! carry a category prefix (`Composition or Attribute/Name`,
//! `Notes/EnhancedDefinition`, ...) that [`normalize_headers`] strips, after
//! which the columns below are looked up by name:
//!
//! | Column | Record field |
//! |---|---|
//! | `Name` | `name` |
//! | `Class` | `declared_class` |
//! | `XPath` | `path` |
//! | `Occurrence` | `cardinality` |
//! | `Codes` | `codes`, one value per line |
//! | `Pattern` | `pattern` |
//! | `EnhancedDefinition` | `description` |
//!
//! Other columns are ignored. Empty cells are absent values.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use tabular_schema_convert::SourceTable;
use tabular_schema_core::{Cardinality, ISO_DATE_TIME_CLASS, Record, RecordPath};

use crate::config::ConvertConfig;
use crate::error::{Result, StoreError};

/// Header prefixes of exported tables and their replacements, applied in
/// order. Each pattern starts at the opening quote of a header cell.
const HEADER_REWRITES: &[(&str, &str)] = &[
    ("\"Composition or Attribute/", "\""),
    ("\"Notes/", "\""),
    ("\"Class, data type of a composition or attribute/Name", "\"Class"),
    ("\"Class, data type of a composition or attribute/", "\""),
];

const DELIMITER: u8 = b';';

/// Column names.
pub mod columns {
    pub const NAME: &str = "Name";
    pub const CLASS: &str = "Class";
    pub const PATH: &str = "XPath";
    pub const OCCURRENCE: &str = "Occurrence";
    pub const CODES: &str = "Codes";
    pub const PATTERN: &str = "Pattern";
    pub const DESCRIPTION: &str = "EnhancedDefinition";
}

/// Strips category prefixes from quoted header cells.
///
/// # Examples
///
/// ```
/// use tabular_schema_store::loader::normalize_headers;
///
/// let raw = r#""Composition or Attribute/Name";"Class, data type of a composition or attribute/Name";"Notes/EnhancedDefinition""#;
/// assert_eq!(normalize_headers(raw), r#""Name";"Class";"EnhancedDefinition""#);
/// ```
pub fn normalize_headers(text: &str) -> String {
    HEADER_REWRITES
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Column positions of one table.
struct ColumnIndex {
    name: usize,
    class: usize,
    path: usize,
    occurrence: usize,
    codes: Option<usize>,
    pattern: Option<usize>,
    description: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord, table: &str) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                StoreError::InvalidInput(format!("{table}: missing column '{name}'"))
            })
        };
        Ok(Self {
            name: require(columns::NAME)?,
            class: require(columns::CLASS)?,
            path: require(columns::PATH)?,
            occurrence: require(columns::OCCURRENCE)?,
            codes: find(columns::CODES),
            pattern: find(columns::PATTERN),
            description: find(columns::DESCRIPTION),
        })
    }
}

fn cell(row: &csv::StringRecord, idx: usize) -> &str {
    row.get(idx).unwrap_or_default()
}

fn optional_cell(row: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| row.get(i))
        .filter(|value| !value.is_empty())
        .map(String::from)
}

/// Parses table text into records, in row order.
///
/// `table` names the source in error messages.
///
/// # Errors
///
/// Returns [`CsvError`](StoreError::CsvError) for malformed CSV,
/// [`InvalidInput`](StoreError::InvalidInput) when a required column is
/// missing, and [`InvalidRecord`](StoreError::InvalidRecord) for an unknown
/// occurrence.
pub fn parse_table(text: &str, table: &str) -> Result<Vec<Record>> {
    let normalized = normalize_headers(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(normalized.as_bytes());

    let headers = reader.headers()?.clone();
    let index = ColumnIndex::from_headers(&headers, table)?;

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row = result?;
        // Header is row 1.
        let row_number = idx + 2;
        let cardinality: Cardinality =
            cell(&row, index.occurrence)
                .parse()
                .map_err(|source| StoreError::InvalidRecord {
                    table: table.to_string(),
                    row: row_number,
                    source,
                })?;

        let mut record = Record::new(
            cell(&row, index.name).trim(),
            cell(&row, index.class).trim(),
            RecordPath::parse(cell(&row, index.path)),
            cardinality,
        );
        record.codes = optional_cell(&row, index.codes).map(|codes| split_codes(&codes));
        record.pattern = optional_cell(&row, index.pattern);
        record.description = optional_cell(&row, index.description);
        records.push(record);
    }

    debug!(table, records = records.len(), "parsed table");
    Ok(records)
}

/// Splits a codes cell into its values, one per line.
pub fn split_codes(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(String::from)
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Reads one table file.
pub fn read_table(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    parse_table(&text, &file_name(path))
}

/// Reads one table file as a named [`SourceTable`].
pub fn load_table(path: impl AsRef<Path>) -> Result<SourceTable> {
    let path = path.as_ref();
    Ok(SourceTable::new(file_name(path), read_table(path)?))
}

/// Reads the gated paths of a permissions table.
///
/// Only the `XPath` column is used; rows with an empty path are ignored.
pub fn read_permissions(path: impl AsRef<Path>) -> Result<Vec<RecordPath>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let normalized = normalize_headers(&text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(normalized.as_bytes());

    let headers = reader.headers()?.clone();
    let Some(path_idx) = headers.iter().position(|h| h.trim() == columns::PATH) else {
        return Err(StoreError::InvalidInput(format!(
            "{}: missing column '{}'",
            file_name(path),
            columns::PATH
        )));
    };

    let mut permissions = Vec::new();
    for result in reader.records() {
        let row = result?;
        let permission = RecordPath::parse(cell(&row, path_idx));
        if !permission.is_empty() {
            permissions.push(permission);
        }
    }
    debug!(file = %path.display(), permissions = permissions.len(), "read permissions");
    Ok(permissions)
}

/// Lists the convertible table files of `dir`, sorted by file name.
///
/// # Errors
///
/// Returns [`InvalidInput`](StoreError::InvalidInput) if `dir` is not a
/// directory.
pub fn scan_tables(dir: impl AsRef<Path>, config: &ConvertConfig) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(StoreError::InvalidInput(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    let mut tables = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv || !path.is_file() {
            continue;
        }
        if config.is_skipped(&file_name(&path)) {
            debug!(file = %path.display(), "skipping table");
            continue;
        }
        tables.push(path);
    }
    tables.sort_by_key(|path| file_name(path));

    info!(dir = %dir.display(), tables = tables.len(), "scanned table directory");
    Ok(tables)
}

/// Reads every convertible table of `dir` plus its permissions table.
///
/// A missing permissions table means no gated fields.
pub fn load_directory(
    dir: impl AsRef<Path>,
    config: &ConvertConfig,
) -> Result<(Vec<SourceTable>, Vec<RecordPath>)> {
    let dir = dir.as_ref();
    let tables = scan_tables(dir, config)?
        .iter()
        .map(load_table)
        .collect::<Result<Vec<_>>>()?;

    let permissions_path = dir.join(&config.permissions_file);
    let permissions = if permissions_path.is_file() {
        read_permissions(&permissions_path)?
    } else {
        debug!(file = %permissions_path.display(), "no permissions table");
        Vec::new()
    };
    Ok((tables, permissions))
}

/// Reads the shared ISO date-time description from a definition document of
/// the form `{ISODateTime: {description: ...}}`.
///
/// # Errors
///
/// Returns [`InvalidInput`](StoreError::InvalidInput) when the document
/// defines another key.
pub fn load_iso_description(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let document: tabular_schema_core::Document = serde_yaml::from_str(&text)?;
    if document.key != ISO_DATE_TIME_CLASS {
        return Err(StoreError::InvalidInput(format!(
            "{}: expected an {ISO_DATE_TIME_CLASS} definition, found '{}'",
            path.display(),
            document.key
        )));
    }
    Ok(document.schema.description.unwrap_or_default())
}

/// Like [`load_iso_description`], but a missing file yields an empty
/// description.
pub fn load_iso_description_or_default(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(file = %path.display(), "no ISO description document");
        return Ok(String::new());
    }
    load_iso_description(path)
}
