//! Error types for empdb operations.

use thiserror::Error;

/// Result type alias using [`EmpDbError`].
pub type Result<T> = std::result::Result<T, EmpDbError>;

/// Error types for empdb operations.
///
/// A search or delete that finds nothing is not an error; those outcomes are
/// reported as `Ok(None)` / `Ok(false)`.
#[derive(Debug, Error)]
pub enum EmpDbError {
    /// Failure to open, read, write, or rename the underlying file.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Header is too short or carries the wrong magic bytes.
    #[error("Invalid database file: {0}")]
    InvalidDatabaseFile(String),

    /// Header version byte does not match the supported format version.
    #[error("Unsupported database version: {version} (expected: {expected})")]
    UnsupportedVersion { version: u8, expected: u8 },

    /// Trailing record shorter than the fixed record size.
    #[error("Truncated record at offset {offset}: {len} of {expected} bytes")]
    TruncatedRecord {
        offset: u64,
        len: usize,
        expected: usize,
    },

    /// Invalid input value (name too long, bad config, ...).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// CSV import/export error.
    #[error("Import error: {0}")]
    ImportError(String),
}

impl EmpDbError {
    /// Returns true for errors meaning the file exists but is not a usable
    /// database file.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDatabaseFile(_) | Self::UnsupportedVersion { .. } | Self::TruncatedRecord { .. }
        )
    }
}
