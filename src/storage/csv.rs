//! CSV import and export of employee records.
//!
//! Rows have three columns: `id,name,salary`. Names are written and read as
//! raw bytes, so a name that is not valid UTF-8 survives an export and
//! re-import unchanged.

use std::io::Write;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{EmpDbError, Result};
use crate::storage::record::{Employee, EmployeeName};
use crate::storage::store::RecordStore;

/// Options for CSV import and export.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field separator (default: ',').
    pub delimiter: u8,
    /// Whether the first row is a header (default: true).
    pub has_header: bool,
    /// Skip bad rows instead of aborting the import (default: false).
    pub ignore_errors: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            ignore_errors: false,
        }
    }
}

impl CsvOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether the file has a header row.
    #[must_use]
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Sets whether to continue past bad rows.
    #[must_use]
    pub fn with_ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }
}

/// Outcome of a CSV import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    /// Records appended to the store.
    pub imported: usize,
    /// Rows skipped because they failed to parse or validate.
    pub skipped: usize,
    /// One message per skipped row.
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow<'a> {
    id: u32,
    #[serde(borrow)]
    name: &'a [u8],
    salary: f32,
}

impl TryFrom<CsvRow<'_>> for Employee {
    type Error = EmpDbError;

    fn try_from(row: CsvRow<'_>) -> Result<Self> {
        Ok(Self {
            id: row.id,
            name: EmployeeName::from_bytes(row.name)?,
            salary: row.salary,
        })
    }
}

fn line_of(position: Option<&::csv::Position>) -> u64 {
    position.map_or(0, ::csv::Position::line)
}

/// Imports `id,name,salary` rows from a CSV file and appends them in a
/// single append.
///
/// Without `ignore_errors` the first bad row aborts the import and nothing
/// is appended.
///
/// # Errors
///
/// Returns `ImportError` if the CSV file cannot be read or a row is invalid,
/// or any error from [`RecordStore::append_records`].
pub fn import_csv(store: &RecordStore, csv_path: &Path, options: &CsvOptions) -> Result<ImportResult> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_header)
        .trim(::csv::Trim::All)
        .from_path(csv_path)
        .map_err(|e| {
            EmpDbError::ImportError(format!("Failed to open {}: {e}", csv_path.display()))
        })?;

    let headers = if options.has_header {
        let headers = reader
            .byte_headers()
            .map_err(|e| EmpDbError::ImportError(format!("Failed to read CSV header: {e}")))?;
        Some(headers.clone())
    } else {
        None
    };

    let mut result = ImportResult::default();
    let mut records = Vec::new();

    for row in reader.byte_records() {
        let parsed = match row {
            Ok(row) => {
                let line = line_of(row.position());
                row.deserialize::<CsvRow>(headers.as_ref())
                    .map_err(|e| EmpDbError::ImportError(format!("line {line}: {e}")))
                    .and_then(|row| {
                        Employee::try_from(row)
                            .map_err(|e| EmpDbError::ImportError(format!("line {line}: {e}")))
                    })
            }
            Err(e) => Err(EmpDbError::ImportError(format!(
                "line {}: {e}",
                line_of(e.position())
            ))),
        };

        match parsed {
            Ok(record) => records.push(record),
            Err(e) if options.ignore_errors => {
                warn!("skipping {e}");
                result.skipped += 1;
                result.errors.push(e.to_string());
            }
            Err(e) => return Err(e),
        }
    }

    store.append_records(&records)?;
    result.imported = records.len();
    info!(
        "imported {} records from {} ({} skipped)",
        result.imported,
        csv_path.display(),
        result.skipped
    );
    Ok(result)
}

/// Writes every record in the store as a CSV row. Returns the row count.
///
/// # Errors
///
/// Returns any scan error from the store, or `ImportError` if writing fails.
pub fn export_csv<W: Write>(store: &RecordStore, writer: W, options: &CsvOptions) -> Result<usize> {
    let mut csv_writer = ::csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_header)
        .from_writer(writer);

    let mut count = 0;
    for record in store.list_records()? {
        let record = record?;
        csv_writer
            .serialize(CsvRow {
                id: record.id,
                name: record.name.as_bytes(),
                salary: record.salary,
            })
            .map_err(|e| EmpDbError::ImportError(format!("Failed to write CSV row: {e}")))?;
        count += 1;
    }

    csv_writer
        .flush()
        .map_err(|e| EmpDbError::ImportError(format!("Failed to flush CSV output: {e}")))?;
    Ok(count)
}
