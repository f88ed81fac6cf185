#![forbid(unsafe_code)]

//! CSV staging and tabular ingestion helpers.
//!
//! `LOAD CSV` can only read files below the database's import root, so a
//! source file is first linked into that directory under
//! [`STAGED_FILE_NAME`]. The staging slot is shared: concurrent imports into
//! the same import directory must be serialized by the caller.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::error::{GraphError, Result};
use crate::value::{PropertyMap, PropertyValue};

/// Fixed file name a CSV file is staged under.
pub const STAGED_FILE_NAME: &str = "import_file.csv";

/// Rows per statement for chunked ingestion.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Which CSV columns become node properties.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnSelection {
    /// Every column in the header.
    #[default]
    All,
    /// Only the listed columns that the header actually contains.
    Only(Vec<String>),
    /// No properties; nodes carry the label only.
    NoProperties,
}

impl From<Option<Vec<String>>> for ColumnSelection {
    /// `Some(vec![])` selects every column, `None` selects none.
    fn from(value: Option<Vec<String>>) -> Self {
        match value {
            None => ColumnSelection::NoProperties,
            Some(cols) if cols.is_empty() => ColumnSelection::All,
            Some(cols) => ColumnSelection::Only(cols),
        }
    }
}

impl ColumnSelection {
    /// Columns to bind against `header`, or `None` for label-only nodes.
    ///
    /// Requested names missing from the header are dropped with a warning.
    pub fn resolve(&self, header: &[String]) -> Option<Vec<String>> {
        match self {
            ColumnSelection::All => Some(header.to_vec()),
            ColumnSelection::NoProperties => None,
            ColumnSelection::Only(requested) => {
                let (kept, dropped): (Vec<&String>, Vec<&String>) =
                    requested.iter().partition(|c| header.contains(c));
                if !dropped.is_empty() {
                    warn!(columns = ?dropped, "requested columns absent from CSV header");
                }
                Some(kept.into_iter().cloned().collect())
            }
        }
    }
}

/// Chunked ingestion settings.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Rows per dispatched statement.
    pub chunk_size: usize,
    /// MERGE each row instead of one CREATE per chunk.
    pub merge: bool,
    /// Draw a progress bar on stderr.
    pub progress: bool,
    /// Rewrite row keys with [`standard_name`](crate::value::standard_name).
    pub normalize_keys: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            merge: false,
            progress: false,
            normalize_keys: false,
        }
    }
}

/// Outcome of a chunked ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows sent to the database.
    pub rows: u64,
    /// Statements dispatched.
    pub statements: u64,
}

/// Outcome of a CSV load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvLoad {
    /// Staged file inside the import directory.
    pub staged: PathBuf,
    /// Columns bound as properties; `None` for label-only nodes.
    pub columns: Option<Vec<String>>,
}

/// Links `source` into `import_dir` as [`STAGED_FILE_NAME`].
///
/// Any previously staged file is removed first, so staging the same file
/// twice succeeds.
pub fn stage_csv(import_dir: &Path, source: &Path) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(GraphError::FileNotFound(source.to_path_buf()));
    }
    if !import_dir.is_dir() {
        return Err(GraphError::FileNotFound(import_dir.to_path_buf()));
    }
    let staged = import_dir.join(STAGED_FILE_NAME);
    unstage(import_dir)?;
    let source = fs::canonicalize(source)?;
    link(&source, &staged)?;
    debug!(source = %source.display(), staged = %staged.display(), "staged CSV file");
    Ok(staged)
}

/// Removes the staged file, if any.
pub fn unstage(import_dir: &Path) -> Result<()> {
    let staged = import_dir.join(STAGED_FILE_NAME);
    match fs::remove_file(&staged) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(unix)]
fn link(source: &Path, staged: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, staged)
}

#[cfg(not(unix))]
fn link(source: &Path, staged: &Path) -> io::Result<()> {
    fs::copy(source, staged).map(|_| ())
}

/// Reads the header row of `path`, trimmed with blank names dropped.
pub fn read_header(path: &Path, field_terminator: char) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(GraphError::FileNotFound(path.to_path_buf()));
    }
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter_byte(field_terminator)?)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?;
    Ok(headers
        .iter()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect())
}

fn delimiter_byte(field_terminator: char) -> Result<u8> {
    u8::try_from(field_terminator)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            GraphError::InvalidArgument(format!(
                "field terminator {field_terminator:?} must be a single ASCII character"
            ))
        })
}

/// Reads a CSV file into typed property rows.
///
/// Values are inferred as bool, integer, float or string; blank cells are
/// left out of the row.
pub struct CsvRowSource {
    reader: csv::Reader<fs::File>,
    headers: StringRecord,
}

impl CsvRowSource {
    /// Opens `path` with `field_terminator` as delimiter.
    pub fn open(path: &Path, field_terminator: char) -> Result<Self> {
        if !path.is_file() {
            return Err(GraphError::FileNotFound(path.to_path_buf()));
        }
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter_byte(field_terminator)?)
            .flexible(true)
            .from_path(path)?;
        let headers = reader.headers()?.clone();
        Ok(Self { reader, headers })
    }

    /// Header names in file order.
    pub fn headers(&self) -> Vec<String> {
        self.headers.iter().map(|h| h.trim().to_string()).collect()
    }
}

impl Iterator for CsvRowSource {
    type Item = Result<PropertyMap>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(true) => Some(Ok(build_row(&self.headers, &record))),
            Ok(false) => None,
            Err(err) => Some(Err(err.into())),
        }
    }
}

fn build_row(headers: &StringRecord, record: &StringRecord) -> PropertyMap {
    let mut row = PropertyMap::new();
    for (header, raw) in headers.iter().zip(record.iter()) {
        let header = header.trim();
        let raw = raw.trim();
        if header.is_empty() || raw.is_empty() {
            continue;
        }
        row.insert(header.to_string(), parse_value(raw));
    }
    row
}

/// Infers a typed value from a raw cell.
pub fn parse_value(raw: &str) -> PropertyValue {
    let lower = raw.to_ascii_lowercase();
    if lower == "true" {
        return PropertyValue::Bool(true);
    }
    if lower == "false" {
        return PropertyValue::Bool(false);
    }
    if let Ok(int_val) = raw.parse::<i64>() {
        return PropertyValue::Int(int_val);
    }
    if let Ok(float_val) = raw.parse::<f64>() {
        if float_val.is_finite() {
            return PropertyValue::Float(float_val);
        }
    }
    PropertyValue::String(raw.to_string())
}
