//! empdb - flat-file employee record store
//!
//! A database file is one fixed 8-byte header followed by fixed 58-byte
//! records. Every operation opens the file, streams it, and closes it; there
//! is no index, cache, or in-memory copy of the data.
//!
//! ```no_run
//! use empdb::{Employee, RecordStore};
//!
//! # fn main() -> empdb::Result<()> {
//! let store = RecordStore::new("staff.db");
//! store.create_file()?;
//! store.append_records(&[Employee::new(1001, "Alice", 60000.0)?])?;
//! assert!(store.search_by_id(1001)?.is_some());
//! assert!(store.delete_by_id(1001)?);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod storage;

pub use error::{EmpDbError, Result};
pub use storage::{
    Employee, EmployeeName, FileHeader, RecordIter, RecordStore, StoreConfig, TailPolicy,
};
