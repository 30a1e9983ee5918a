//! Storage module for the flat-file record store.
//!
//! This module provides:
//! - The fixed file header codec ([`header`])
//! - The fixed-size employee record layout ([`record`])
//! - File-level create/append/list/search/delete ([`RecordStore`])
//! - CSV import and export ([`csv`])
//!
//! # File Format
//!
//! ```text
//! [header: magic(4) | version(1) | reserved(3)]
//! [record 0: id(4) | name(50) | salary(4)]
//! [record 1: ...]
//! ```
//!
//! Record `n` starts at `HEADER_SIZE + n * RECORD_SIZE`. There are no
//! separators, checksums or free lists.

pub mod csv;
pub mod header;
pub mod record;
mod store;

pub use csv::{export_csv, import_csv, CsvOptions, ImportResult};
pub use header::{validate_header, write_header, FileHeader};
pub use record::{sample_employees, Employee, EmployeeName};
pub use store::{RecordIter, RecordStore, StoreConfig, TailPolicy};

/// Magic bytes for database file identification.
pub const MAGIC_BYTES: &[u8; 4] = b"MYDB";

/// Current database format version.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Size of the name field in bytes.
pub const NAME_LEN: usize = 50;

/// Size of one record in bytes.
pub const RECORD_SIZE: usize = 4 + NAME_LEN + 4;
